//! # carehub-api
//!
//! HTTP API layer for CareHub built on Axum.
//!
//! Every `/api` route except `/api/health` runs behind the request guard
//! (rate limit, then session, then handler). Errors and panics are turned
//! into the JSON error envelope here.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
