//! Axum middleware stack.

pub mod cors;
pub mod guard;
pub mod logging;
pub mod panic;
pub mod rate_limit;

pub use guard::{ClientInfo, GuardState, api_guard};
pub use rate_limit::{RateDecision, RateLimiter};
