//! # carehub-auth
//!
//! Session validation for the CareHub request guard.
//!
//! ## Modules
//!
//! - `jwt`: JWT token creation, validation, and blocklist management
//! - `session`: resolves an [`AuthSession`](carehub_core::types::AuthSession)
//!   from request headers

pub mod jwt;
pub mod session;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use session::JwtSessionProvider;
