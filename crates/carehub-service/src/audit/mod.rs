//! The change-audit pipeline: field diffing, logging, the retrying trail,
//! and ledger queries.

pub mod diff;
pub mod logger;
pub mod query;
pub mod store;
pub mod trail;

pub use diff::{JsonObject, compute_field_changes};
pub use logger::{AuditActionInput, ChangeLogger, EntityChangeInput};
pub use query::AuditQueryService;
pub use store::AuditStore;
pub use trail::{AuditTrail, usable};
