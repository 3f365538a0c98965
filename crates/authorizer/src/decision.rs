//! Authorization decision.
//!
//! Turns a verification outcome into an allow/deny policy document. The
//! caller learns only the effect; the failure reason is logged and counted.

use crate::claims::Claims;
use crate::error::AuthError;
use crate::metrics::record_authorization;
use crate::verifier::TokenVerifier;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Principal reported on every denial.
pub const DENIED_PRINCIPAL: &str = "user";

/// Policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Action governed by the policy.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Authorizer invocation event.
///
/// Only `authorizationToken` is consulted; the other fields are accepted
/// for compatibility with the gateway's event shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    /// Event type, e.g. "TOKEN".
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Raw authorization header value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_token: Option<String>,

    /// ARN of the invoked method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_arn: Option<String>,
}

/// Policy effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    /// Lowercase label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }
}

/// One policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

/// Policy document attached to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

/// Authorizer response returned to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
}

impl AuthorizerResponse {
    /// Build a single-statement policy for any resource.
    pub fn new(principal_id: impl Into<String>, effect: Effect) -> Self {
        Self {
            principal_id: principal_id.into(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: INVOKE_ACTION.to_string(),
                    effect,
                    resource: "*".to_string(),
                }],
            },
        }
    }

    /// Effect of the first statement.
    pub fn effect(&self) -> Effect {
        self.policy_document
            .statement
            .first()
            .map_or(Effect::Deny, |statement| statement.effect)
    }

    /// Whether the request is allowed.
    pub fn is_allowed(&self) -> bool {
        self.effect() == Effect::Allow
    }
}

/// Map a verification outcome to a policy response.
///
/// Allowed responses carry the token's subject; every failure yields the
/// same denial with principal [`DENIED_PRINCIPAL`].
pub fn decide(outcome: Result<Claims, AuthError>) -> AuthorizerResponse {
    match outcome {
        Ok(claims) => {
            tracing::debug!(target: "authorizer.decision", "User was authorized");
            record_authorization(Effect::Allow.as_str(), "ok");
            AuthorizerResponse::new(claims.sub, Effect::Allow)
        }
        Err(err) => {
            tracing::warn!(
                target: "authorizer.decision",
                reason = err.kind(),
                error = %err,
                "User not authorized"
            );
            record_authorization(Effect::Deny.as_str(), err.kind());
            AuthorizerResponse::new(DENIED_PRINCIPAL, Effect::Deny)
        }
    }
}

/// Bearer token authorizer.
pub struct Authorizer {
    verifier: TokenVerifier,
}

impl Authorizer {
    /// Create an authorizer around a token verifier.
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Underlying verifier.
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Decide on a raw authorization header value.
    #[instrument(skip_all, name = "authorizer.decision.authorize_header")]
    pub async fn authorize_header(&self, auth_header: Option<&str>) -> AuthorizerResponse {
        decide(self.verifier.verify(auth_header).await)
    }

    /// Decide on an authorizer invocation event.
    pub async fn authorize(&self, event: &AuthorizerEvent) -> AuthorizerResponse {
        self.authorize_header(event.authorization_token.as_deref())
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            exp: None,
            iat: None,
            iss: None,
            aud: None,
        }
    }

    #[test]
    fn test_decide_allow_uses_subject() {
        let response = decide(Ok(claims("auth0|alice")));

        assert_eq!(response.principal_id, "auth0|alice");
        assert_eq!(response.effect(), Effect::Allow);
        assert!(response.is_allowed());
    }

    #[test]
    fn test_decide_deny_is_uniform() {
        let errors = vec![
            AuthError::KeySetUnavailable("status 503".to_string()),
            AuthError::NoSigningKey,
            AuthError::MissingAuthHeader,
            AuthError::MalformedToken,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
        ];

        let responses: Vec<_> = errors.into_iter().map(|e| decide(Err(e))).collect();

        for response in &responses {
            assert_eq!(response.principal_id, DENIED_PRINCIPAL);
            assert_eq!(response.effect(), Effect::Deny);
        }
        assert!(responses.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_response_wire_shape() {
        let response = AuthorizerResponse::new("auth0|alice", Effect::Allow);

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "principalId": "auth0|alice",
                "policyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Action": "execute-api:Invoke",
                        "Effect": "Allow",
                        "Resource": "*"
                    }]
                }
            })
        );
    }

    #[test]
    fn test_event_deserialization() {
        let event: AuthorizerEvent = serde_json::from_str(
            r#"{"type":"TOKEN","authorizationToken":"Bearer abc","methodArn":"arn:aws:execute-api:x"}"#,
        )
        .unwrap();

        assert_eq!(event.event_type.as_deref(), Some("TOKEN"));
        assert_eq!(event.authorization_token.as_deref(), Some("Bearer abc"));
        assert_eq!(event.method_arn.as_deref(), Some("arn:aws:execute-api:x"));
    }

    #[test]
    fn test_event_all_fields_optional() {
        let event: AuthorizerEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event, AuthorizerEvent::default());
    }
}
