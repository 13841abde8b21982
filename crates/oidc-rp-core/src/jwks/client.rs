//! JWKS retrieval with a per-URI TTL cache.

use super::KeySet;
use crate::cache::{CacheStats, TtlCache};
use crate::endpoint::check_endpoint;
use crate::error::JwksError;
use crate::platform::{Clock, CryptoBackend, JsonFetcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default lifetime of a cached key set
pub const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(3600);

/// Fetches JWK Sets, imports their keys and caches the result per URI.
///
/// Only successfully imported key sets are cached. Concurrent misses for
/// the same URI may each fetch; the last one to finish wins the cache slot.
pub struct JwksClient<F, B: CryptoBackend, C> {
    fetcher: F,
    backend: B,
    clock: C,
    cache: TtlCache<KeySet<B::Key>>,
    require_https: bool,
}

impl<F, B, C> JwksClient<F, B, C>
where
    F: JsonFetcher,
    B: CryptoBackend,
    C: Clock,
{
    /// Create a client with the default one hour TTL
    pub fn new(fetcher: F, backend: B, clock: C) -> Self {
        Self {
            fetcher,
            backend,
            clock,
            cache: TtlCache::new("jwks", DEFAULT_JWKS_TTL),
            require_https: true,
        }
    }

    /// Builder: set the cache TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new("jwks", ttl);
        self
    }

    /// Builder: allow plain http for non-loopback hosts
    pub fn require_https(mut self, require: bool) -> Self {
        self.require_https = require;
        self
    }

    /// The crypto backend keys are imported with
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetch (or serve from cache) the key set published at `jwks_uri`.
    ///
    /// # Errors
    ///
    /// - [`JwksError::InvalidUri`] if the URI fails the https policy
    /// - [`JwksError::Fetch`] if the endpoint cannot be fetched
    /// - [`JwksError::InvalidJwks`] if the body is not a JWK Set
    /// - [`JwksError::InvalidKey`] if a supported key fails to import
    pub async fn fetch_jwks(&self, jwks_uri: &str) -> Result<Arc<KeySet<B::Key>>, JwksError> {
        let now = self.clock.now_secs();
        if let Some(cached) = self.cache.get(jwks_uri, now) {
            debug!(jwks_uri, "Using cached JWKS");
            return Ok(cached);
        }

        check_endpoint(jwks_uri, self.require_https).map_err(|reason| JwksError::InvalidUri {
            jwks_uri: jwks_uri.to_string(),
            reason,
        })?;

        debug!(jwks_uri, "Fetching JWKS");
        let body = self.fetcher.get_json(jwks_uri).await.map_err(|e| {
            error!(jwks_uri, error = %e, "JWKS fetch failed");
            JwksError::Fetch(e)
        })?;

        let key_set = KeySet::from_jwks(jwks_uri, body, &self.backend).map_err(|e| {
            warn!(jwks_uri, error = %e, "Rejected JWKS");
            e
        })?;

        info!(
            jwks_uri,
            key_count = key_set.len(),
            backend = self.backend.name(),
            "Loaded JWKS"
        );
        Ok(self
            .cache
            .insert(jwks_uri, key_set, self.clock.now_secs()))
    }

    /// Drop the cached key set for `jwks_uri`. Returns true if one existed.
    pub fn invalidate(&self, jwks_uri: &str) -> bool {
        let removed = self.cache.invalidate(jwks_uri);
        if removed {
            debug!(jwks_uri, "Invalidated cached JWKS");
        }
        removed
    }

    /// Drop every cached key set
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(self.clock.now_secs())
    }
}

impl<F, B: CryptoBackend, C> std::fmt::Debug for JwksClient<F, B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksClient")
            .field("ttl", &self.cache.ttl())
            .field("cached", &self.cache.len())
            .field("require_https", &self.require_https)
            .finish_non_exhaustive()
    }
}
