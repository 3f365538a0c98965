//! Test server harness for E2E testing
//!
//! Provides `TestGalleryServer` for spawning real gallery server instances in
//! tests, backed by the in-memory document store and a mocked JWKS endpoint.

use crate::crypto_fixtures::{RsaFixture, PRIMARY};
use crate::jwks_mock::{jwks_url, mount_jwks};
use gallery_service::config::Config;
use gallery_service::observability::metrics::build_metrics_handle;
use gallery_service::routes::{self, AppState};
use gallery_service::store::MemoryDocumentStore;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use wiremock::MockServer;

/// Bucket name the harness configures for presigned URLs.
pub const TEST_BUCKET: &str = "gallery-test-images";

/// Test harness for spawning the gallery service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<()> {
///     let server = TestGalleryServer::spawn().await?;
///
///     let response = reqwest::get(format!("{}/v1/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestGalleryServer {
    addr: SocketAddr,
    config: Config,
    jwks_server: MockServer,
    _handle: JoinHandle<()>,
}

impl TestGalleryServer {
    /// Spawn a server whose identity provider publishes the `PRIMARY` key.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_key(&PRIMARY, HashMap::new()).await
    }

    /// Spawn a server whose identity provider publishes `fixture`.
    ///
    /// `overrides` replace or extend the harness's environment, e.g. to set
    /// `JWT_AUDIENCE`.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with_key(
        fixture: &RsaFixture,
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let jwks_server = MockServer::start().await;
        mount_jwks(&jwks_server, fixture, None).await;

        // Build configuration for test environment
        let mut vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("JWKS_URL".to_string(), jwks_url(&jwks_server)),
            ("IMAGES_S3_BUCKET".to_string(), TEST_BUCKET.to_string()),
            ("AWS_ACCESS_KEY_ID".to_string(), "AKIDEXAMPLE".to_string()),
            (
                "AWS_SECRET_ACCESS_KEY".to_string(),
                "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            ),
        ]);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState::from_config(
            config.clone(),
            Arc::new(MemoryDocumentStore::new()),
        ));

        // Non-global recorder so several servers can run in one process
        let metrics_handle = build_metrics_handle()
            .map_err(|e| anyhow::anyhow!("Failed to build metrics handle: {}", e))?;

        let app = routes::build_routes(state, metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            jwks_server,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the mocked identity provider.
    pub fn jwks_server(&self) -> &MockServer {
        &self.jwks_server
    }
}

impl Drop for TestGalleryServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestGalleryServer::spawn().await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));

        let response = reqwest::get(format!("{}/v1/health", server.url())).await?;
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["status"], "healthy");

        Ok(())
    }

    #[tokio::test]
    async fn test_server_provides_config_access() -> Result<(), anyhow::Error> {
        let server = TestGalleryServer::spawn().await?;

        let config = server.config();

        assert_eq!(config.images_bucket, TEST_BUCKET);
        assert_eq!(config.jwks_url, jwks_url(server.jwks_server()));

        Ok(())
    }

    #[tokio::test]
    async fn test_overrides_reach_config() -> Result<(), anyhow::Error> {
        let overrides = HashMap::from([(
            "JWT_AUDIENCE".to_string(),
            "https://gallery.example.com".to_string(),
        )]);

        let server = TestGalleryServer::spawn_with_key(&PRIMARY, overrides).await?;

        assert_eq!(
            server.config().jwt_audience.as_deref(),
            Some("https://gallery.example.com")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_servers_different_ports() -> Result<(), anyhow::Error> {
        let server1 = TestGalleryServer::spawn().await?;
        let server2 = TestGalleryServer::spawn().await?;

        assert_ne!(server1.addr(), server2.addr());

        let response1 = reqwest::get(format!("{}/v1/health", server1.url())).await?;
        assert_eq!(response1.status(), 200);

        let response2 = reqwest::get(format!("{}/v1/health", server2.url())).await?;
        assert_eq!(response2.status(), 200);

        Ok(())
    }
}
