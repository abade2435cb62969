// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Autra API Library
//!
//! Student login, meeting token issuance and per-page form state, exposed
//! over HTTP by the `autra-api` binary.

pub mod auth;
pub mod config;
pub mod error;
pub mod meeting;
pub mod pages;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
