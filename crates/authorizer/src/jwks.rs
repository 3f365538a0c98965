//! JWKS client and signing key selection.
//!
//! Fetches the identity provider's JSON Web Key Set and picks the single
//! RS256 signing key the verifier trusts.
//!
//! Only one active signing key is supported: when several keys qualify the
//! first one in the published order wins, so a rotation window with two
//! simultaneously valid keys is not handled.

use crate::error::AuthError;
use crate::metrics::record_jwks_fetch;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

/// Default timeout for the JWKS request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON Web Key as published by the identity provider.
///
/// Every field is optional here; whether a key is usable is decided by
/// [`select_signing_key`], not by deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SigningKey {
    /// Key ID.
    #[serde(default)]
    pub kid: Option<String>,

    /// Key type (must be "RSA").
    #[serde(default)]
    pub kty: Option<String>,

    /// Algorithm (must be "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (must be "sig").
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// X.509 certificate chain, leaf first (standard base64).
    #[serde(default)]
    pub x5c: Option<Vec<String>>,
}

impl SigningKey {
    /// Leaf certificate of the chain, if any.
    pub fn leaf_certificate(&self) -> Option<&str> {
        self.x5c
            .as_ref()
            .and_then(|chain| chain.first())
            .map(String::as_str)
            .filter(|cert| !cert.is_empty())
    }

    fn is_rs256_signing_key(&self) -> bool {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.is_empty())
        }

        self.key_use.as_deref() == Some("sig")
            && self.kty.as_deref() == Some("RSA")
            && self.alg.as_deref() == Some("RS256")
            && present(&self.n)
            && present(&self.e)
            && present(&self.kid)
            && self.leaf_certificate().is_some()
    }
}

/// Key set returned by one JWKS fetch, in published order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeySet {
    /// Published keys.
    #[serde(default)]
    pub keys: Vec<SigningKey>,
}

/// Select the signing key used to verify tokens.
///
/// Returns the first key that is an RSA key for RS256 signatures with `n`,
/// `e`, `kid` and a non-empty `x5c` chain.
///
/// # Errors
///
/// Returns `AuthError::NoSigningKey` if no key qualifies.
pub fn select_signing_key(key_set: &KeySet) -> Result<&SigningKey, AuthError> {
    key_set
        .keys
        .iter()
        .find(|key| key.is_rs256_signing_key())
        .ok_or_else(|| {
            tracing::warn!(
                target: "authorizer.jwks",
                key_count = key_set.keys.len(),
                "No RS256 signing key found in key set"
            );
            AuthError::NoSigningKey
        })
}

/// Source of signing key sets.
///
/// Implemented by [`JwksClient`]; tests substitute their own source to
/// observe how often the certificate pipeline runs.
#[async_trait::async_trait]
pub trait KeySetSource: Send + Sync {
    /// Fetch the current key set.
    async fn fetch_key_set(&self) -> Result<KeySet, AuthError>;
}

/// HTTP client for the identity provider's JWKS endpoint.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,
}

impl JwksClient {
    /// Create a JWKS client with the default request timeout.
    pub fn new(jwks_url: String) -> Self {
        Self::with_timeout(jwks_url, DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a JWKS client with a custom request timeout.
    pub fn with_timeout(jwks_url: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "authorizer.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
        }
    }

    /// URL this client fetches from.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    async fn fetch(&self) -> Result<KeySet, AuthError> {
        tracing::info!(target: "authorizer.jwks", url = %self.jwks_url, "Fetching signing key set");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "authorizer.jwks", error = %e, "Failed to fetch JWKS");
                AuthError::KeySetUnavailable("request failed".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(target: "authorizer.jwks", status = %status, "JWKS endpoint returned error");
            return Err(AuthError::KeySetUnavailable(format!("status {}", status)));
        }

        let key_set: KeySet = response.json().await.map_err(|e| {
            tracing::error!(target: "authorizer.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::KeySetUnavailable("unparseable body".to_string())
        })?;

        if key_set.keys.is_empty() {
            tracing::error!(target: "authorizer.jwks", "JWKS response contains no keys");
            return Err(AuthError::KeySetUnavailable("no keys".to_string()));
        }

        tracing::debug!(
            target: "authorizer.jwks",
            key_count = key_set.keys.len(),
            "Signing key set fetched"
        );

        Ok(key_set)
    }
}

#[async_trait::async_trait]
impl KeySetSource for JwksClient {
    #[instrument(skip(self), name = "authorizer.jwks.fetch")]
    async fn fetch_key_set(&self) -> Result<KeySet, AuthError> {
        let result = self.fetch().await;
        record_jwks_fetch(if result.is_ok() { "success" } else { "error" });
        result
    }
}
