//! # Gallery Test Utilities
//!
//! Shared test utilities for the authorizer and the gallery service.
//!
//! This crate provides:
//! - Deterministic RSA key fixtures (`PRIMARY`, `ROTATED`)
//! - Token builders for signing test JWTs
//! - A mocked JWKS endpoint
//! - Server test harness (`TestGalleryServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gallery_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestGalleryServer::spawn().await?;
//!     let token = TestTokenBuilder::new().sign(&PRIMARY);
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/groups", server.url()))
//!         .header("Authorization", bearer(&token))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_mock;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_mock::*;
pub use server_harness::*;
pub use token_builders::*;
