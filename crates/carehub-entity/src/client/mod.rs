//! Client (employer organization) entities.

pub mod filter;
pub mod model;

pub use filter::{ClientFilter, ClientSortField};
pub use model::{CLIENT_ENTITY, Client, ClientPatch, NewClient};
