//! Client (employer organization) management.

pub mod service;
pub mod store;

pub use service::ClientService;
pub use store::ClientStore;
