//! Bearer token verification.
//!
//! Extracts the token from the authorization header, checks it against the
//! cached signing certificate and returns its claims.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only RS256 is accepted; the advertised algorithm is checked before the
//!   certificate is fetched
//! - Header and token shape are validated before the certificate cache is
//!   consulted, so malformed requests never cause a JWKS fetch

use crate::cache::CertificateCache;
use crate::claims::Claims;
use crate::error::AuthError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use tracing::instrument;

/// Maximum accepted token size in bytes.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Default leeway for `exp` checks in seconds.
pub const DEFAULT_LEEWAY_SECONDS: u64 = 60;

const BEARER_PREFIX: &str = "bearer ";

/// Tunables for claim validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierSettings {
    /// Clock skew tolerance for `exp`.
    pub leeway_seconds: u64,

    /// Expected `aud`; audience is not checked when unset.
    pub audience: Option<String>,

    /// Expected `iss`; issuer is not checked when unset.
    pub issuer: Option<String>,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
            audience: None,
            issuer: None,
        }
    }
}

/// Extract the bearer token from an authorization header value.
///
/// The scheme is matched case-insensitively; the token is the second
/// whitespace-delimited segment.
///
/// # Errors
///
/// - `MissingAuthHeader` if the header is absent or empty
/// - `MalformedAuthHeader` if it does not start with `bearer `
/// - `MalformedToken` if no token follows the scheme
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<&str, AuthError> {
    let header = match auth_header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(AuthError::MissingAuthHeader),
    };

    let has_bearer_scheme = header
        .get(..BEARER_PREFIX.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(BEARER_PREFIX));
    if !has_bearer_scheme {
        return Err(AuthError::MalformedAuthHeader);
    }

    header
        .split_whitespace()
        .nth(1)
        .ok_or(AuthError::MalformedToken)
}

/// RS256 token verifier backed by the certificate cache.
pub struct TokenVerifier {
    /// Signing certificate source.
    cache: Arc<CertificateCache>,

    /// Prepared claim validation rules.
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier over a certificate cache.
    pub fn new(cache: Arc<CertificateCache>, settings: &VerifierSettings) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = settings.leeway_seconds;
        validation.validate_exp = true;
        // `exp` is checked when present but not required.
        validation.required_spec_claims.clear();

        match &settings.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                validation.required_spec_claims.insert("aud".to_string());
            }
            None => validation.validate_aud = false,
        }

        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_string());
        }

        Self { cache, validation }
    }

    /// Certificate cache used by this verifier.
    pub fn cache(&self) -> &Arc<CertificateCache> {
        &self.cache
    }

    /// Verify the token carried by an authorization header.
    ///
    /// # Errors
    ///
    /// Returns the specific [`AuthError`] for the first check that fails.
    /// Certificate pipeline errors from the cache are propagated unchanged.
    #[instrument(skip_all, name = "authorizer.verifier.verify")]
    pub async fn verify(&self, auth_header: Option<&str>) -> Result<Claims, AuthError> {
        let token = extract_bearer_token(auth_header)?;

        if token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(
                target: "authorizer.verifier",
                token_size = token.len(),
                max_size = MAX_TOKEN_SIZE_BYTES,
                "Token rejected: size exceeds maximum"
            );
            return Err(AuthError::MalformedToken);
        }

        let header = decode_header(token).map_err(|e| {
            tracing::debug!(target: "authorizer.verifier", error = %e, "Token header could not be parsed");
            AuthError::MalformedToken
        })?;

        if header.alg != Algorithm::RS256 {
            tracing::debug!(target: "authorizer.verifier", alg = ?header.alg, "Token rejected: algorithm not RS256");
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let certificate = self.cache.get().await?;

        let token_data =
            decode::<Claims>(token, certificate.decoding_key(), &self.validation).map_err(|e| {
                tracing::debug!(target: "authorizer.verifier", error = %e, "Token verification failed");
                map_jwt_error(e.kind())
            })?;

        tracing::debug!(target: "authorizer.verifier", "Token verified");
        Ok(token_data.claims)
    }
}

fn map_jwt_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm("mismatch".to_string()),
        ErrorKind::InvalidAudience => AuthError::InvalidClaims("aud".to_string()),
        ErrorKind::InvalidIssuer => AuthError::InvalidClaims("iss".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => AuthError::InvalidClaims(claim.clone()),
        ErrorKind::InvalidRsaKey(reason) => AuthError::InvalidCertificate(reason.clone()),
        _ => AuthError::MalformedToken,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::jwks::{KeySet, KeySetSource};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use gallery_test_utils::crypto_fixtures::PRIMARY;
    use gallery_test_utils::token_builders::TestTokenBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        jwks: serde_json::Value,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl KeySetSource for StaticSource {
        async fn fetch_key_set(&self) -> Result<KeySet, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            serde_json::from_value(self.jwks.clone())
                .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))
        }
    }

    fn verifier_with(settings: &VerifierSettings) -> (TokenVerifier, Arc<StaticSource>) {
        let source = Arc::new(StaticSource {
            jwks: PRIMARY.jwks_json(),
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(CertificateCache::new(source.clone()));
        (TokenVerifier::new(cache, settings), source)
    }

    fn verifier() -> (TokenVerifier, Arc<StaticSource>) {
        verifier_with(&VerifierSettings::default())
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    // =========================================================================
    // Header extraction
    // =========================================================================

    #[test]
    fn test_extract_missing_header() {
        assert_eq!(extract_bearer_token(None), Err(AuthError::MissingAuthHeader));
        assert_eq!(extract_bearer_token(Some("")), Err(AuthError::MissingAuthHeader));
    }

    #[test]
    fn test_extract_wrong_scheme() {
        assert_eq!(
            extract_bearer_token(Some("Basic xyz")),
            Err(AuthError::MalformedAuthHeader)
        );
        assert_eq!(
            extract_bearer_token(Some("Bearer")),
            Err(AuthError::MalformedAuthHeader)
        );
        assert_eq!(
            extract_bearer_token(Some("Bearerabc.def.ghi")),
            Err(AuthError::MalformedAuthHeader)
        );
    }

    #[test]
    fn test_extract_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer_token(Some("bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer_token(Some("BEARER abc")), Ok("abc"));
        assert_eq!(extract_bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_extract_takes_second_segment() {
        assert_eq!(extract_bearer_token(Some("Bearer abc trailing")), Ok("abc"));
        assert_eq!(
            extract_bearer_token(Some("Bearer   ")),
            Err(AuthError::MalformedToken)
        );
    }

    #[test]
    fn test_extract_non_ascii_header() {
        assert_eq!(
            extract_bearer_token(Some("Bé")),
            Err(AuthError::MalformedAuthHeader)
        );
    }

    // =========================================================================
    // Verification
    // =========================================================================

    #[tokio::test]
    async fn test_valid_token_returns_claims() {
        let (verifier, _) = verifier();
        let token = TestTokenBuilder::new().subject("auth0|alice").sign(&PRIMARY);

        let claims = verifier.verify(Some(&bearer(&token))).await.unwrap();

        assert_eq!(claims.sub, "auth0|alice");
    }

    #[tokio::test]
    async fn test_token_without_exp_is_accepted() {
        let (verifier, _) = verifier();
        let token = TestTokenBuilder::new().without_expiry().sign(&PRIMARY);

        let claims = verifier.verify(Some(&bearer(&token))).await.unwrap();
        assert!(claims.exp.is_none());
    }

    #[tokio::test]
    async fn test_expired_token() {
        let (verifier, _) = verifier();
        let token = TestTokenBuilder::new().expired().sign(&PRIMARY);

        assert_eq!(
            verifier.verify(Some(&bearer(&token))).await,
            Err(AuthError::TokenExpired)
        );
    }

    #[tokio::test]
    async fn test_tampered_payload_fails_signature() {
        let (verifier, _) = verifier();
        let token = TestTokenBuilder::new().subject("alice").sign(&PRIMARY);
        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"mallory"}"#);
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(
            verifier.verify(Some(&bearer(&forged))).await,
            Err(AuthError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn test_non_rs256_algorithms_rejected_before_fetch() {
        let (verifier, source) = verifier();
        let rs384 = TestTokenBuilder::new().sign_with_algorithm(&PRIMARY, jsonwebtoken::Algorithm::RS384);
        let hs256 = TestTokenBuilder::new().sign_hs256(b"shared-secret");

        for token in [rs384, hs256] {
            let result = verifier.verify(Some(&bearer(&token))).await;
            assert!(
                matches!(result, Err(AuthError::UnsupportedAlgorithm(_))),
                "Expected UnsupportedAlgorithm, got {:?}",
                result
            );
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_alg_none_rejected() {
        let (verifier, _) = verifier();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"mallory"}"#);
        let token = format!("{}.{}.", header, payload);

        let result = verifier.verify(Some(&bearer(&token))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_garbage_token_is_malformed() {
        let (verifier, source) = verifier();

        assert_eq!(
            verifier.verify(Some("Bearer abc.def.ghi")).await,
            Err(AuthError::MalformedToken)
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_token_is_malformed() {
        let (verifier, _) = verifier();
        let token = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);

        assert_eq!(
            verifier.verify(Some(&bearer(&token))).await,
            Err(AuthError::MalformedToken)
        );
    }

    #[tokio::test]
    async fn test_audience_enforced_when_configured() {
        let settings = VerifierSettings {
            audience: Some("https://gallery.example.com".to_string()),
            ..VerifierSettings::default()
        };
        let (verifier, _) = verifier_with(&settings);

        let good = TestTokenBuilder::new()
            .audience("https://gallery.example.com")
            .sign(&PRIMARY);
        let wrong = TestTokenBuilder::new().audience("https://other.example.com").sign(&PRIMARY);
        let missing = TestTokenBuilder::new().sign(&PRIMARY);

        assert!(verifier.verify(Some(&bearer(&good))).await.is_ok());
        assert!(matches!(
            verifier.verify(Some(&bearer(&wrong))).await,
            Err(AuthError::InvalidClaims(_))
        ));
        assert!(matches!(
            verifier.verify(Some(&bearer(&missing))).await,
            Err(AuthError::InvalidClaims(_))
        ));
    }

    #[tokio::test]
    async fn test_audience_ignored_when_not_configured() {
        let (verifier, _) = verifier();
        let token = TestTokenBuilder::new().audience("anything").sign(&PRIMARY);

        assert!(verifier.verify(Some(&bearer(&token))).await.is_ok());
    }

    #[tokio::test]
    async fn test_issuer_enforced_when_configured() {
        let settings = VerifierSettings {
            issuer: Some("https://tenant.example.com/".to_string()),
            ..VerifierSettings::default()
        };
        let (verifier, _) = verifier_with(&settings);

        let good = TestTokenBuilder::new()
            .issuer("https://tenant.example.com/")
            .sign(&PRIMARY);
        let wrong = TestTokenBuilder::new().issuer("https://evil.example.com/").sign(&PRIMARY);

        assert!(verifier.verify(Some(&bearer(&good))).await.is_ok());
        assert!(matches!(
            verifier.verify(Some(&bearer(&wrong))).await,
            Err(AuthError::InvalidClaims(_))
        ));
    }

    #[test]
    fn test_default_settings() {
        let settings = VerifierSettings::default();
        assert_eq!(settings.leeway_seconds, 60);
        assert!(settings.audience.is_none());
        assert!(settings.issuer.is_none());
    }
}
