//! Bearer token authorizer.
//!
//! Verifies RS256 bearer tokens against the signing certificate published in
//! an identity provider's JWKS and turns the outcome into an allow/deny
//! policy decision.
//!
//! # Pipeline
//!
//! ```text
//! decision -> verifier -> cache -> (miss) jwks fetch -> key selection -> certificate
//! ```
//!
//! # Modules
//!
//! - `jwks` - Key set fetching and signing key selection
//! - `certificate` - PEM formatting and verification key parsing
//! - `cache` - Process-wide certificate memoization
//! - `verifier` - Header extraction and token verification
//! - `decision` - Allow/deny policy responses
//! - `error` - Failure kinds of the pipeline

pub mod cache;
pub mod certificate;
pub mod claims;
pub mod decision;
pub mod error;
pub mod jwks;
pub mod metrics;
pub mod verifier;

pub use cache::CertificateCache;
pub use claims::Claims;
pub use decision::{decide, Authorizer, AuthorizerEvent, AuthorizerResponse, Effect};
pub use error::AuthError;
pub use jwks::{JwksClient, KeySetSource};
pub use verifier::{TokenVerifier, VerifierSettings};
