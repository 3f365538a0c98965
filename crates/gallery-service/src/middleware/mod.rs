//! HTTP middleware for the gallery service.

pub mod auth;
pub mod http_metrics;

pub use auth::{require_auth, Principal};
pub use http_metrics::http_metrics_middleware;
