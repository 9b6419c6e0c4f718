//! Core traits defined in `carehub-core` and implemented by other crates.

pub mod cache;
pub mod session;

pub use cache::CacheProvider;
pub use session::SessionProvider;
