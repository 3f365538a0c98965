//! Certificate formatting.
//!
//! The identity provider publishes its signing certificate as a bare base64
//! DER string in `x5c[0]`. It is wrapped into PEM and parsed once into the
//! verification key used for every token afterwards.

use crate::error::AuthError;
use crate::jwks::SigningKey;
use jsonwebtoken::DecodingKey;
use std::fmt;

/// Width of a PEM body line.
const PEM_LINE_WIDTH: usize = 64;

const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
const PEM_FOOTER: &str = "-----END CERTIFICATE-----";

/// Wrap a base64 certificate into PEM.
///
/// The body is split into 64-character lines; header and footer lines are
/// each followed by a newline.
pub fn cert_to_pem(cert: &str) -> String {
    let chars: Vec<char> = cert.chars().collect();
    let body = chars
        .chunks(PEM_LINE_WIDTH)
        .map(|line| line.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n{}\n{}\n", PEM_HEADER, body, PEM_FOOTER)
}

/// Signing certificate derived from the selected JWKS key.
#[derive(Clone)]
pub struct Certificate {
    kid: String,
    pem: String,
    decoding_key: DecodingKey,
}

impl Certificate {
    /// Build the certificate from a key that passed selection.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NoSigningKey` if the key carries no certificate and
    /// `AuthError::InvalidCertificate` if the PEM does not hold an RSA key.
    pub fn from_signing_key(key: &SigningKey) -> Result<Self, AuthError> {
        let leaf = key.leaf_certificate().ok_or(AuthError::NoSigningKey)?;
        let pem = cert_to_pem(leaf);

        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
            tracing::error!(target: "authorizer.certificate", error = %e, "Signing certificate is not a valid RSA certificate");
            AuthError::InvalidCertificate(e.to_string())
        })?;

        Ok(Self {
            kid: key.kid.clone().unwrap_or_default(),
            pem,
            decoding_key,
        })
    }

    /// Key ID of the JWKS entry this certificate came from.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// PEM encoding of the certificate.
    pub fn pem(&self) -> &str {
        &self.pem
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.kid == other.kid && self.pem == other.pem
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("kid", &self.kid)
            .field("pem_len", &self.pem.len())
            .finish()
    }
}
