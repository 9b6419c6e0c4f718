//! Staff (client employee) entities.

pub mod filter;
pub mod model;

pub use filter::{StaffFilter, StaffSortField};
pub use model::{NewStaff, STAFF_ENTITY, Staff, StaffPatch, StaffUpdate};
