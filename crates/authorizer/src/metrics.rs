//! Authorizer metrics.
//!
//! All metrics follow Prometheus naming conventions:
//! - `authorizer_` prefix
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! - `status`: 2 values (success, error)
//! - `effect`: 2 values (allow, deny)
//! - `reason`: bounded by `AuthError::kind` plus "ok"

use metrics::counter;

/// Record a JWKS fetch attempt.
///
/// Metric: `authorizer_jwks_fetches_total`
/// Labels: `status`
pub fn record_jwks_fetch(status: &str) {
    counter!("authorizer_jwks_fetches_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an authorization decision.
///
/// Metric: `authorizer_decisions_total`
/// Labels: `effect`, `reason`
pub fn record_authorization(effect: &str, reason: &str) {
    counter!("authorizer_decisions_total",
        "effect" => effect.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}
