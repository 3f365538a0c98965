//! Builder patterns for test tokens
//!
//! Provides a fluent API for signing test JWTs with the RSA fixtures.

use crate::crypto_fixtures::RsaFixture;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for signed test JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .subject("auth0|alice")
///     .expires_in(3600)
///     .sign(&PRIMARY);
/// ```
pub struct TestTokenBuilder {
    sub: String,
    exp: Option<i64>,
    iat: i64,
    aud: Option<String>,
    iss: Option<String>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults (valid for one hour)
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            iat: now.timestamp(),
            aud: None,
            iss: None,
        }
    }

    /// Set the subject
    pub fn subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Expire the token well beyond any configured leeway
    pub fn expired(self) -> Self {
        self.expires_in(-3600)
    }

    /// Omit the `exp` claim
    pub fn without_expiry(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Set the audience
    pub fn audience(mut self, audience: &str) -> Self {
        self.aud = Some(audience.to_string());
        self
    }

    /// Set the issuer
    pub fn issuer(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Build the claims as a JSON value
    pub fn claims(&self) -> Value {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!(self.sub));
        claims.insert("iat".to_string(), json!(self.iat));
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        if let Some(aud) = &self.aud {
            claims.insert("aud".to_string(), json!(aud));
        }
        if let Some(iss) = &self.iss {
            claims.insert("iss".to_string(), json!(iss));
        }
        Value::Object(claims)
    }

    /// Sign with RS256 using the fixture's private key
    pub fn sign(self, fixture: &RsaFixture) -> String {
        self.sign_with_algorithm(fixture, Algorithm::RS256)
    }

    /// Sign with another RSA algorithm using the fixture's private key
    pub fn sign_with_algorithm(self, fixture: &RsaFixture, algorithm: Algorithm) -> String {
        let key = EncodingKey::from_rsa_pem(fixture.private_key_pem.as_bytes())
            .expect("fixture private key should parse");
        let mut header = Header::new(algorithm);
        header.kid = Some(fixture.kid.to_string());

        encode(&header, &self.claims(), &key).expect("token signing should succeed")
    }

    /// Sign with HS256 using a shared secret
    pub fn sign_hs256(self, secret: &[u8]) -> String {
        let key = EncodingKey::from_secret(secret);
        encode(&Header::new(Algorithm::HS256), &self.claims(), &key)
            .expect("token signing should succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Authorization header value for a token
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
