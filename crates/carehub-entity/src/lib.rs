//! # carehub-entity
//!
//! Domain entity models for CareHub. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities derive `sqlx::FromRow`.

pub mod audit;
pub mod client;
pub mod staff;
