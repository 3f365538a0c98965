//! Object store client for image uploads.
//!
//! Uploads never pass through the service: clients receive a time-limited
//! pre-signed PUT URL and send the bytes straight to the bucket.
//!
//! [`S3ObjectStore`] presigns with AWS Signature Version 4 query parameters
//! (`UNSIGNED-PAYLOAD`, only the `host` header signed).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const TERMINATOR: &str = "aws4_request";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Object store errors.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Request signing failed: {0}")]
    Signing(String),
}

/// Object store collaborator used by the image handlers.
pub trait ObjectStore: Send + Sync {
    /// Pre-signed URL the client may PUT the object to.
    fn upload_url(&self, key: &str) -> Result<String, ObjectStoreError>;

    /// Public URL the object is served from.
    fn object_url(&self, key: &str) -> String;
}

/// AWS credentials used for presigning.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
}

/// S3 bucket presigner.
#[derive(Clone)]
pub struct S3ObjectStore {
    bucket: String,
    region: String,
    credentials: AwsCredentials,
    expires_in_seconds: u64,
}

impl S3ObjectStore {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        credentials: AwsCredentials,
        expires_in_seconds: u64,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            credentials,
            expires_in_seconds,
        }
    }

    fn host(&self) -> String {
        format!("{}.s3.amazonaws.com", self.bucket)
    }

    /// Presign a request for `key` at a fixed instant.
    ///
    /// # Errors
    ///
    /// `ObjectStoreError::Signing` if the signing key cannot be derived.
    pub fn presign(
        &self,
        method: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ObjectStoreError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/{}", date_stamp, self.region, SERVICE, TERMINATOR);
        let host = self.host();
        let path = format!("/{}", encode_path(key));

        let mut params = vec![
            ("X-Amz-Algorithm".to_string(), ALGORITHM.to_string()),
            (
                "X-Amz-Credential".to_string(),
                format!("{}/{}", self.credentials.access_key_id, scope),
            ),
            ("X-Amz-Date".to_string(), amz_date.clone()),
            (
                "X-Amz-Expires".to_string(),
                self.expires_in_seconds.to_string(),
            ),
            ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
        ];
        if let Some(token) = &self.credentials.session_token {
            params.push((
                "X-Amz-Security-Token".to_string(),
                token.expose_secret().to_string(),
            ));
        }
        params.sort();

        let canonical_query = params
            .iter()
            .map(|(k, v)| {
                format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))
            })
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\n\nhost\n{}",
            method, path, canonical_query, host, UNSIGNED_PAYLOAD
        );

        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.signing_key(&date_stamp)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        Ok(format!(
            "https://{}{}?{}&X-Amz-Signature={}",
            host, path, canonical_query, signature
        ))
    }

    fn signing_key(&self, date_stamp: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key.expose_secret());
        let k_date = hmac_sha256(secret.as_bytes(), date_stamp.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
        hmac_sha256(&k_service, TERMINATOR.as_bytes())
    }
}

impl ObjectStore for S3ObjectStore {
    fn upload_url(&self, key: &str) -> Result<String, ObjectStoreError> {
        self.presign("PUT", key, Utc::now())
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://{}/{}", self.host(), encode_path(key))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ObjectStoreError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| ObjectStoreError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Object path with each `/`-separated segment percent-encoded.
fn encode_path(key: &str) -> String {
    key.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}
