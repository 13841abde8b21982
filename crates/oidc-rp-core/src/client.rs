//! Composed relying party: discovery, key sets and token validation.

use crate::config::{KeyRotationPolicy, OidcConfig};
use crate::discovery::{DiscoveryClient, DiscoveryDocument};
use crate::error::{DiscoveryError, JwksError, Result, ValidationError};
use crate::jwks::{JwksClient, KeySet};
use crate::jwt::{IdTokenClaims, ValidationOptions, validate_id_token};
use crate::platform::{Clock, CryptoBackend, JsonFetcher};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// OpenID Connect relying party over a fetcher, crypto backend and clock.
///
/// The three seams are picked at construction time; the native and WASM
/// crates provide ready-made aliases.
///
/// ```rust,ignore
/// let client = OidcClient::new(fetcher, backend, clock, OidcConfig::default());
/// let claims = client
///     .validate_id_token(&id_token, "https://accounts.example.com", "my-client",
///         client.options().with_nonce(nonce))
///     .await?;
/// ```
pub struct OidcClient<F, B: CryptoBackend, C> {
    discovery: DiscoveryClient<Arc<F>, Arc<C>>,
    jwks: JwksClient<Arc<F>, Arc<B>, Arc<C>>,
    backend: Arc<B>,
    clock: Arc<C>,
    config: OidcConfig,
}

impl<F, B, C> OidcClient<F, B, C>
where
    F: JsonFetcher,
    B: CryptoBackend,
    C: Clock,
{
    /// Create a client; both caches start empty.
    pub fn new(fetcher: F, backend: B, clock: C, config: OidcConfig) -> Self {
        let fetcher = Arc::new(fetcher);
        let backend = Arc::new(backend);
        let clock = Arc::new(clock);

        let discovery = DiscoveryClient::new(Arc::clone(&fetcher), Arc::clone(&clock))
            .with_ttl(config.discovery_ttl)
            .require_https(config.require_https);
        let jwks = JwksClient::new(fetcher, Arc::clone(&backend), Arc::clone(&clock))
            .with_ttl(config.jwks_ttl)
            .require_https(config.require_https);

        Self {
            discovery,
            jwks,
            backend,
            clock,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    /// Discovery client, for cache control
    pub fn discovery(&self) -> &DiscoveryClient<Arc<F>, Arc<C>> {
        &self.discovery
    }

    /// JWKS client, for cache control
    pub fn jwks(&self) -> &JwksClient<Arc<F>, Arc<B>, Arc<C>> {
        &self.jwks
    }

    /// Validation options seeded with the configured leeway
    pub fn options(&self) -> ValidationOptions {
        ValidationOptions::new().with_leeway(self.config.leeway)
    }

    /// Discovery document of `issuer` (cached).
    ///
    /// # Errors
    ///
    /// See [`DiscoveryClient::fetch_discovery_document`].
    pub async fn discover(&self, issuer: &str) -> Result<Arc<DiscoveryDocument>, DiscoveryError> {
        self.discovery.fetch_discovery_document(issuer).await
    }

    /// Key set published at `jwks_uri` (cached).
    ///
    /// # Errors
    ///
    /// See [`JwksClient::fetch_jwks`].
    pub async fn key_set(&self, jwks_uri: &str) -> Result<Arc<KeySet<B::Key>>, JwksError> {
        self.jwks.fetch_jwks(jwks_uri).await
    }

    /// Discover `issuer`, load its keys and validate `token` for `audience`.
    ///
    /// When `opts.allowed_algorithms` is unset, the provider's advertised
    /// `id_token_signing_alg_values_supported` is used.
    ///
    /// Under [`KeyRotationPolicy::RefetchOnUnknownKid`], a token naming an
    /// unknown `kid` causes one JWKS invalidation and refetch before the
    /// token is validated again.
    ///
    /// # Errors
    ///
    /// [`Error::Discovery`](crate::Error::Discovery),
    /// [`Error::Jwks`](crate::Error::Jwks) or
    /// [`Error::Validation`](crate::Error::Validation) for the failing stage.
    #[instrument(skip_all, fields(issuer = %issuer, audience = %audience))]
    pub async fn validate_id_token(
        &self,
        token: &str,
        issuer: &str,
        audience: &str,
        opts: ValidationOptions,
    ) -> Result<IdTokenClaims> {
        let document = self.discover(issuer).await?;
        let opts = if opts.allowed_algorithms.is_none() {
            opts.with_discovery_algorithms(&document)
        } else {
            opts
        };

        let keys = self.key_set(&document.jwks_uri).await?;
        match self.validate_with(token, &keys, issuer, audience, &opts).await {
            Err(err)
                if err.is_unknown_key()
                    && self.config.key_rotation == KeyRotationPolicy::RefetchOnUnknownKid =>
            {
                info!(jwks_uri = %document.jwks_uri, "Unknown kid, refetching JWKS once");
                self.jwks.invalidate(&document.jwks_uri);
                let keys = self.key_set(&document.jwks_uri).await?;
                self.validate_with(token, &keys, issuer, audience, &opts)
                    .await
                    .map_err(Into::into)
            }
            other => other.map_err(Into::into),
        }
    }

    async fn validate_with(
        &self,
        token: &str,
        keys: &KeySet<B::Key>,
        issuer: &str,
        audience: &str,
        opts: &ValidationOptions,
    ) -> Result<IdTokenClaims, ValidationError> {
        validate_id_token(
            self.backend.as_ref(),
            self.clock.as_ref(),
            token,
            keys,
            issuer,
            audience,
            opts,
        )
        .await
        .inspect_err(|err| warn!(reason = err.kind(), error = %err, "ID token rejected"))
    }
}

impl<F, B: CryptoBackend, C> std::fmt::Debug for OidcClient<F, B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcClient")
            .field("discovery", &self.discovery)
            .field("jwks", &self.jwks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
