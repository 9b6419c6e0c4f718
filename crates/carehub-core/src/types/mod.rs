//! Core type definitions used across the CareHub workspace.

pub mod pagination;
pub mod patch;
pub mod session;
pub mod sorting;

pub use pagination::{PageMetadata, PageRequest, PageResponse};
pub use session::{AuthSession, Role};
pub use sorting::SortDirection;
