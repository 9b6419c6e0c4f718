//! Route handlers organized by domain.

pub mod audit;
pub mod client;
pub mod health;
pub mod staff;
