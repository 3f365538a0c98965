//! Gallery service configuration.
//!
//! Configuration is loaded from environment variables. Credentials and the
//! database URL are redacted in Debug output.

use authorizer::verifier::{VerifierSettings, DEFAULT_LEEWAY_SECONDS};
use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Maximum accepted JWT clock skew in seconds.
pub const MAX_CLOCK_SKEW_SECONDS: u64 = 600;

/// Default JWKS request timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Default lifetime of pre-signed upload URLs in seconds.
pub const DEFAULT_SIGNED_URL_EXPIRATION: u64 = 300;

/// Longest lifetime S3 accepts for a pre-signed URL (7 days).
pub const MAX_SIGNED_URL_EXPIRATION: u64 = 604_800;

/// Default AWS region.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Gallery service configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Identity provider JWKS endpoint.
    pub jwks_url: String,

    /// Leeway for `exp` checks in seconds.
    pub jwt_clock_skew_seconds: u64,

    /// Expected token audience, if audience validation is enabled.
    pub jwt_audience: Option<String>,

    /// Expected token issuer, if issuer validation is enabled.
    pub jwt_issuer: Option<String>,

    /// JWKS request timeout in seconds.
    pub jwks_fetch_timeout_seconds: u64,

    /// Groups table name.
    pub groups_table: String,

    /// Images table name.
    pub images_table: String,

    /// Name of the images index keyed by `imageId`.
    pub image_id_index: String,

    /// Bucket holding uploaded images.
    pub images_bucket: String,

    /// Upload URL lifetime in seconds.
    pub signed_url_expiration: u64,

    /// AWS region used for signing.
    pub aws_region: String,

    /// AWS access key ID.
    pub aws_access_key_id: String,

    /// AWS secret access key.
    pub aws_secret_access_key: SecretString,

    /// Temporary-credential session token.
    pub aws_session_token: Option<SecretString>,

    /// PostgreSQL URL; the in-memory store is used when unset.
    pub database_url: Option<SecretString>,

    /// Seconds to wait between the shutdown signal and stopping the server.
    pub drain_seconds: u64,
}

impl Config {
    /// Token validation settings derived from this configuration.
    pub fn verifier_settings(&self) -> VerifierSettings {
        VerifierSettings {
            leeway_seconds: self.jwt_clock_skew_seconds,
            audience: self.jwt_audience.clone(),
            issuer: self.jwt_issuer.clone(),
        }
    }
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("jwks_url", &self.jwks_url)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("jwt_audience", &self.jwt_audience)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwks_fetch_timeout_seconds", &self.jwks_fetch_timeout_seconds)
            .field("groups_table", &self.groups_table)
            .field("images_table", &self.images_table)
            .field("image_id_index", &self.image_id_index)
            .field("images_bucket", &self.images_bucket)
            .field("signed_url_expiration", &self.signed_url_expiration)
            .field("aws_region", &self.aws_region)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"[REDACTED]")
            .field(
                "aws_session_token",
                &self.aws_session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid JWKS fetch timeout configuration: {0}")]
    InvalidJwksFetchTimeout(String),

    #[error("Invalid signed URL expiration configuration: {0}")]
    InvalidSignedUrlExpiration(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainSeconds(String),
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name).filter(|value| !value.is_empty()).cloned()
}

fn or_default(vars: &HashMap<String, String>, name: &str, default: &str) -> String {
    optional(vars, name).unwrap_or_else(|| default.to_string())
}

/// Parse an unsigned integer variable, checking it against an inclusive range.
fn parse_ranged(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    min: u64,
    max: u64,
    err: fn(String) -> ConfigError,
) -> Result<u64, ConfigError> {
    let Some(value_str) = optional(vars, name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| {
        err(format!(
            "{} must be a valid non-negative integer, got '{}': {}",
            name, value_str, e
        ))
    })?;

    if value < min || value > max {
        return Err(err(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }

    Ok(value)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwks_url = required(vars, "JWKS_URL")?;
        let images_bucket = required(vars, "IMAGES_S3_BUCKET")?;
        let aws_access_key_id = required(vars, "AWS_ACCESS_KEY_ID")?;
        let aws_secret_access_key = SecretString::from(required(vars, "AWS_SECRET_ACCESS_KEY")?);

        let jwt_clock_skew_seconds = parse_ranged(
            vars,
            "JWT_CLOCK_SKEW_SECONDS",
            DEFAULT_LEEWAY_SECONDS,
            0,
            MAX_CLOCK_SKEW_SECONDS,
            ConfigError::InvalidJwtClockSkew,
        )?;

        let jwks_fetch_timeout_seconds = parse_ranged(
            vars,
            "JWKS_FETCH_TIMEOUT_SECONDS",
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS,
            1,
            u64::MAX,
            ConfigError::InvalidJwksFetchTimeout,
        )?;

        let signed_url_expiration = parse_ranged(
            vars,
            "SIGNED_URL_EXPIRATION",
            DEFAULT_SIGNED_URL_EXPIRATION,
            1,
            MAX_SIGNED_URL_EXPIRATION,
            ConfigError::InvalidSignedUrlExpiration,
        )?;

        let drain_seconds = parse_ranged(
            vars,
            "GALLERY_DRAIN_SECONDS",
            0,
            0,
            u64::MAX,
            ConfigError::InvalidDrainSeconds,
        )?;

        Ok(Config {
            bind_address: or_default(vars, "BIND_ADDRESS", DEFAULT_BIND_ADDRESS),
            jwks_url,
            jwt_clock_skew_seconds,
            jwt_audience: optional(vars, "JWT_AUDIENCE"),
            jwt_issuer: optional(vars, "JWT_ISSUER"),
            jwks_fetch_timeout_seconds,
            groups_table: or_default(vars, "GROUPS_TABLE", "groups"),
            images_table: or_default(vars, "IMAGES_TABLE", "images"),
            image_id_index: or_default(vars, "IMAGE_ID_INDEX", "image-id-index"),
            images_bucket,
            signed_url_expiration,
            aws_region: or_default(vars, "AWS_REGION", DEFAULT_AWS_REGION),
            aws_access_key_id,
            aws_secret_access_key,
            aws_session_token: optional(vars, "AWS_SESSION_TOKEN").map(SecretString::from),
            database_url: optional(vars, "DATABASE_URL").map(SecretString::from),
            drain_seconds,
        })
    }
}
