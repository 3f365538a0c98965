//! Authorizer error types.
//!
//! Every variant collapses to the same generic denial at the decision
//! boundary. The variants exist so the reason can be logged and counted
//! server-side; none of them is ever shown to the caller.

use thiserror::Error;

/// Failure kinds of the token verification pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The JWKS endpoint could not be reached, returned an error status,
    /// an unparseable body, or an empty key set.
    #[error("Signing key set unavailable: {0}")]
    KeySetUnavailable(String),

    /// No key in the set qualifies as an RS256 signing key.
    #[error("No usable RS256 signing key in key set")]
    NoSigningKey,

    /// The selected key's certificate could not be turned into a verification key.
    #[error("Invalid signing certificate: {0}")]
    InvalidCertificate(String),

    /// The authorization header is absent or empty.
    #[error("Missing authorization header")]
    MissingAuthHeader,

    /// The authorization header does not use the bearer scheme.
    #[error("Malformed authorization header")]
    MalformedAuthHeader,

    /// The token is missing, oversized, or cannot be parsed as a JWT.
    #[error("Malformed token")]
    MalformedToken,

    /// The token advertises an algorithm other than RS256.
    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature does not match the cached certificate.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The token's `exp` claim is in the past.
    #[error("Token expired")]
    TokenExpired,

    /// Audience or issuer did not match the configured values.
    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),
}

impl AuthError {
    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::KeySetUnavailable(_) => "key_set_unavailable",
            AuthError::NoSigningKey => "no_signing_key",
            AuthError::InvalidCertificate(_) => "invalid_certificate",
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::MalformedAuthHeader => "malformed_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_does_not_leak_token_material() {
        assert_eq!(AuthError::MalformedToken.to_string(), "Malformed token");
        assert_eq!(
            AuthError::KeySetUnavailable("status 503".to_string()).to_string(),
            "Signing key set unavailable: status 503"
        );
    }

    #[test]
    fn test_kind_labels_are_distinct() {
        let errors = [
            AuthError::KeySetUnavailable(String::new()),
            AuthError::NoSigningKey,
            AuthError::InvalidCertificate(String::new()),
            AuthError::MissingAuthHeader,
            AuthError::MalformedAuthHeader,
            AuthError::MalformedToken,
            AuthError::UnsupportedAlgorithm(String::new()),
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::InvalidClaims(String::new()),
        ];

        let mut kinds: Vec<&str> = errors.iter().map(AuthError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }
}
