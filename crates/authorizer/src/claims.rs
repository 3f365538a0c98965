//! JWT claims structure.
//!
//! The `sub` field is redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims of a verified token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier) - redacted in Debug output.
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience, either a single string or a list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_debug_redacts_sub() {
        let claims = Claims {
            sub: "auth0|secret-user-id".to_string(),
            exp: Some(1234567890),
            iat: Some(1234567800),
            iss: Some("https://tenant.example.com/".to_string()),
            aud: None,
        };

        let debug_str = format!("{:?}", claims);

        assert!(!debug_str.contains("secret-user-id"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_claims_only_sub_required() {
        let claims: Claims = serde_json::from_str(r#"{"sub":"user-1","nonce":"abc"}"#).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert!(claims.exp.is_none());
        assert!(claims.iat.is_none());
    }

    #[test]
    fn test_claims_missing_sub_rejected() {
        let result = serde_json::from_str::<Claims>(r#"{"exp":1234567890}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_claims_audience_list() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"u","aud":["api","https://tenant/userinfo"]}"#).unwrap();

        assert_eq!(claims.aud, Some(serde_json::json!(["api", "https://tenant/userinfo"])));
    }
}
