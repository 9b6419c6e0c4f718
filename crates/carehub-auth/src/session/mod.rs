//! Request session resolution.

pub mod provider;

pub use provider::JwtSessionProvider;
