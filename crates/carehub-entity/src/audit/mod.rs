//! Change-audit ledger entities.

pub mod filter;
pub mod kind;
pub mod metadata;
pub mod model;

pub use filter::AuditLogFilter;
pub use kind::{AuditAction, ChangeType};
pub use metadata::{ChangeMetadata, ChangeSource};
pub use model::{AuditLog, EntityChange, FieldChange, NewAuditLog, NewEntityChange, NewFieldChange};
