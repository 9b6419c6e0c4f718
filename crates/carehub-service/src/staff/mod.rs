//! Staff management, including bulk operations.

pub mod service;
pub mod store;

pub use service::StaffService;
pub use store::StaffStore;
