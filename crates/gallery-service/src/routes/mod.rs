//! HTTP routes for the gallery service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth};
use crate::repositories::{groups_table, images_table};
use crate::services::{AwsCredentials, ObjectStore, S3ObjectStore};
use crate::store::{DocumentStore, TableSchema};
use authorizer::{Authorizer, CertificateCache, JwksClient, TokenVerifier};
use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    set_header::SetResponseHeaderLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Document store holding groups and images.
    pub store: Arc<dyn DocumentStore>,

    /// Object store for image bytes.
    pub object_store: Arc<dyn ObjectStore>,

    /// Bearer token authorizer shared by `/v1/authorize` and the auth middleware.
    pub authorizer: Arc<Authorizer>,

    /// Groups table schema.
    pub groups_table: TableSchema,

    /// Images table schema.
    pub images_table: TableSchema,
}

impl AppState {
    /// Assemble state from explicit collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        object_store: Arc<dyn ObjectStore>,
        authorizer: Arc<Authorizer>,
    ) -> Self {
        let groups_table = groups_table(&config.groups_table);
        let images_table = images_table(&config.images_table, &config.image_id_index);
        Self {
            config,
            store,
            object_store,
            authorizer,
            groups_table,
            images_table,
        }
    }

    /// Assemble state with the JWKS-backed authorizer and the S3 presigner
    /// described by `config`.
    pub fn from_config(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let jwks_client = JwksClient::with_timeout(
            config.jwks_url.clone(),
            Duration::from_secs(config.jwks_fetch_timeout_seconds),
        );
        let cache = Arc::new(CertificateCache::new(Arc::new(jwks_client)));
        let authorizer = Arc::new(Authorizer::new(TokenVerifier::new(
            cache,
            &config.verifier_settings(),
        )));

        let object_store = Arc::new(S3ObjectStore::new(
            config.images_bucket.clone(),
            config.aws_region.clone(),
            AwsCredentials {
                access_key_id: config.aws_access_key_id.clone(),
                secret_access_key: config.aws_secret_access_key.clone(),
                session_token: config.aws_session_token.clone(),
            },
            config.signed_url_expiration,
        ));

        Self::new(config, store, object_store, authorizer)
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/v1/health` - Liveness check - public
/// - `/v1/authorize` - Authorizer entry point - public, always 200
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/groups`, `/groups/:groupId`, `/groups/:groupId/images`,
///   `/images/:imageId` - CRUD routes behind the auth middleware
/// - `Access-Control-Allow-Origin: *` on every response
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        .route("/v1/authorize", post(handlers::authorize))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route(
            "/groups",
            get(handlers::list_groups).post(handlers::create_group),
        )
        .route("/groups/:group_id", delete(handlers::delete_group))
        .route(
            "/groups/:group_id/images",
            get(handlers::list_group_images).post(handlers::create_image),
        )
        .route("/images/:image_id", get(handlers::get_image))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. SetResponseHeaderLayer - CORS origin on every response
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(middleware::from_fn(http_metrics_middleware))
}
