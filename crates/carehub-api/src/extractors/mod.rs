//! Custom Axum extractors.

pub mod body;
pub mod context;
pub mod pagination;
pub mod path;

pub use body::{ApiJson, ApiQuery, ValidatedJson};
pub use context::AuthContext;
pub use pagination::{PaginationParams, SortParams};
