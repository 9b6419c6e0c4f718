//! # carehub-service
//!
//! Business logic service layer for CareHub. Services orchestrate
//! repositories, the cache, and the change-audit pipeline to implement
//! application-level use cases.
//!
//! Services follow constructor injection; all dependencies are provided
//! at construction time via `Arc` references.

pub mod audit;
pub mod client;
pub mod context;
pub mod staff;

pub use audit::{
    AuditActionInput, AuditQueryService, AuditStore, AuditTrail, ChangeLogger, EntityChangeInput,
    compute_field_changes,
};
pub use client::{ClientService, ClientStore};
pub use context::RequestContext;
pub use staff::{StaffService, StaffStore};
