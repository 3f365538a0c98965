//! Gallery Service Library
//!
//! HTTP backend for photo groups and their images, protected by a bearer
//! token authorizer.
//!
//! # Architecture
//!
//! The service follows the Handler -> Repository -> Store pattern:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> repositories/*.rs -> store (DocumentStore)
//!                               \-> services/object_store.rs (ObjectStore)
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication and HTTP metrics middleware
//! - `models` - Response envelopes and document attributes
//! - `observability` - Prometheus metrics
//! - `repositories` - Table layouts for groups and images
//! - `routes` - Axum router setup
//! - `services` - Object store presigning
//! - `store` - Document store trait and backends

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod store;
