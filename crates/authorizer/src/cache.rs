//! Process-wide signing certificate cache.
//!
//! The certificate is fetched on first use and kept for the lifetime of the
//! process. There is no TTL: a key rotation on the identity provider is only
//! picked up by a fresh process or an explicit [`CertificateCache::invalidate`].
//!
//! Concurrent first use may run the fetch pipeline more than once. The first
//! certificate stored wins and every caller receives that one, so two
//! different certificates are never observed by one process. Failed fetches
//! are not cached.

use crate::certificate::Certificate;
use crate::error::AuthError;
use crate::jwks::{select_signing_key, KeySetSource};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

/// Memoized signing certificate.
pub struct CertificateCache {
    /// Where key sets come from on a cache miss.
    source: Arc<dyn KeySetSource>,

    /// Cached certificate, if fetched.
    slot: RwLock<Option<Arc<Certificate>>>,
}

impl CertificateCache {
    /// Create an empty cache over a key set source.
    pub fn new(source: Arc<dyn KeySetSource>) -> Self {
        Self {
            source,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached certificate, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Propagates `KeySetUnavailable`, `NoSigningKey` and `InvalidCertificate`
    /// from the fetch pipeline. The cache stays empty on failure.
    #[instrument(skip_all, name = "authorizer.cache.get")]
    pub async fn get(&self) -> Result<Arc<Certificate>, AuthError> {
        if let Some(certificate) = self.cached().await {
            tracing::debug!(target: "authorizer.cache", "Certificate cache hit");
            return Ok(certificate);
        }

        // Fetch outside the lock; readers are never blocked on the network.
        let key_set = self.source.fetch_key_set().await?;
        let key = select_signing_key(&key_set)?;
        let fetched = Arc::new(Certificate::from_signing_key(key)?);

        let mut slot = self.slot.write().await;
        match slot.as_ref() {
            Some(existing) => {
                tracing::debug!(target: "authorizer.cache", "Certificate stored by a concurrent fetch, keeping it");
                Ok(Arc::clone(existing))
            }
            None => {
                tracing::info!(target: "authorizer.cache", kid = %fetched.kid(), "Signing certificate cached");
                *slot = Some(Arc::clone(&fetched));
                Ok(fetched)
            }
        }
    }

    /// Cached certificate without triggering a fetch.
    pub async fn cached(&self) -> Option<Arc<Certificate>> {
        self.slot.read().await.clone()
    }

    /// Drop the cached certificate so the next `get` fetches again.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        if slot.take().is_some() {
            tracing::info!(target: "authorizer.cache", "Signing certificate invalidated");
        }
    }
}
