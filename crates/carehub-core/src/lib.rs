//! # carehub-core
//!
//! Core crate for CareHub. Contains traits, configuration schemas,
//! typed identifiers, pagination/sorting types, the authenticated
//! session model, and the unified error system.
//!
//! This crate has **no** internal dependencies on other CareHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
