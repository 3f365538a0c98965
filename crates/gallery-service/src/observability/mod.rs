//! Observability: Prometheus metrics for the gallery service.

pub mod metrics;
