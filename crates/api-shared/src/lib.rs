//! # API Shared
//!
//! Shared definitions for CarePoint APIs.
//!
//! Contains:
//! - The health check and its response body
//! - The API-key header name and extraction
//! - The JSON error body returned by every failing request
//!
//! Used by `api-rest` and the `carepoint-run` server binary.

pub mod auth;
pub mod error;
pub mod health;

pub use auth::{extract_api_key, API_KEY_HEADER};
pub use error::{ErrorBody, ErrorDetail};
pub use health::{HealthRes, HealthService};
