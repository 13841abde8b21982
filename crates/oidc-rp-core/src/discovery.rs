//! OpenID Provider discovery.
//!
//! Fetches `{issuer}/.well-known/openid-configuration`, shape-validates the
//! document (collecting every problem, not just the first) and caches
//! accepted documents per issuer.
//!
//! ```rust,ignore
//! let discovery = DiscoveryClient::new(fetcher, clock);
//! let doc = discovery.fetch_discovery_document("https://accounts.example.com").await?;
//! let keys = jwks.fetch_jwks(&doc.jwks_uri).await?;
//! ```

use crate::cache::{CacheStats, TtlCache};
use crate::endpoint::check_issuer;
use crate::error::{DiscoveryError, FieldError};
use crate::jwt::Algorithm;
use crate::platform::{Clock, JsonFetcher};
use crate::shape::ShapeCheck;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Path appended to the issuer to locate the discovery document
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

/// Default lifetime of a cached discovery document
pub const DEFAULT_DISCOVERY_TTL: Duration = Duration::from_secs(3600);

/// Issuer with at most one trailing `/` removed.
pub fn normalize_issuer(issuer: &str) -> &str {
    issuer.strip_suffix('/').unwrap_or(issuer)
}

/// Discovery URL for `issuer`.
///
/// `https://idp.example.com` and `https://idp.example.com/` map to the same
/// URL.
pub fn well_known_url(issuer: &str) -> String {
    format!("{}{WELL_KNOWN_PATH}", normalize_issuer(issuer))
}

/// OpenID Provider Metadata (OpenID Connect Discovery 1.0, section 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// REQUIRED. Issuer identifier
    pub issuer: String,

    /// REQUIRED. Authorization endpoint URL
    pub authorization_endpoint: String,

    /// REQUIRED. Token endpoint URL
    pub token_endpoint: String,

    /// REQUIRED. JWK Set document URL
    pub jwks_uri: String,

    /// REQUIRED. Supported `response_type` values
    pub response_types_supported: Vec<String>,

    /// REQUIRED. Supported subject identifier types
    pub subject_types_supported: Vec<String>,

    /// REQUIRED. JWS algorithms the provider signs ID tokens with
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// UserInfo endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    /// RP-initiated logout endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<String>,

    /// Token introspection endpoint URL (RFC 7662)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<String>,

    /// Token revocation endpoint URL (RFC 7009)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,

    /// Supported scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes_supported: Option<Vec<String>>,

    /// Supported claim names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims_supported: Option<Vec<String>>,

    /// Supported grant types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_types_supported: Option<Vec<String>>,

    /// Supported PKCE methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_methods_supported: Option<Vec<String>>,

    /// Every other member of the document
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl DiscoveryDocument {
    /// Shape-validate a fetched document for `expected_issuer`.
    ///
    /// # Errors
    ///
    /// Returns every field-level problem found, including an `issuer` that
    /// is not exactly `expected_issuer`. ID tokens are later checked against
    /// the same string, so a trailing `/` difference is a mismatch.
    pub fn from_json(value: Value, expected_issuer: &str) -> Result<Self, Vec<FieldError>> {
        let mut check = ShapeCheck::new(&value, "discovery document")?;

        if let Some(issuer) = check.required_url("issuer")
            && issuer != expected_issuer
        {
            check.push(
                "issuer",
                format!("'{issuer}' does not match the requested issuer '{expected_issuer}'"),
            );
        }
        check.required_url("authorization_endpoint");
        check.required_url("token_endpoint");
        check.required_url("jwks_uri");
        check.required_string_list("response_types_supported");
        check.required_string_list("subject_types_supported");
        check.required_string_list("id_token_signing_alg_values_supported");

        for field in [
            "userinfo_endpoint",
            "end_session_endpoint",
            "introspection_endpoint",
            "revocation_endpoint",
        ] {
            check.optional_url(field);
        }
        for field in [
            "scopes_supported",
            "claims_supported",
            "grant_types_supported",
            "code_challenge_methods_supported",
        ] {
            check.optional_string_list(field);
        }
        check.finish()?;

        serde_json::from_value(value).map_err(|e| vec![FieldError::new("$", e.to_string())])
    }

    /// Advertised ID token algorithms this crate can verify.
    ///
    /// Values such as `none` or `HS256` are dropped, so the result may be
    /// empty, in which case every token is refused.
    pub fn signing_algorithms(&self) -> Vec<Algorithm> {
        self.id_token_signing_alg_values_supported
            .iter()
            .filter_map(|alg| alg.parse().ok())
            .collect()
    }
}

/// Discovery client with a per-issuer TTL cache.
///
/// Documents are cached under the issuer exactly as requested, and only after
/// validation. Concurrent misses for the same issuer may each fetch; the last
/// one to finish wins the cache slot.
pub struct DiscoveryClient<F, C> {
    fetcher: F,
    clock: C,
    cache: TtlCache<DiscoveryDocument>,
    require_https: bool,
}

impl<F: JsonFetcher, C: Clock> DiscoveryClient<F, C> {
    /// Create a client with the default one hour TTL
    pub fn new(fetcher: F, clock: C) -> Self {
        Self {
            fetcher,
            clock,
            cache: TtlCache::new("discovery", DEFAULT_DISCOVERY_TTL),
            require_https: true,
        }
    }

    /// Builder: set the cache TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new("discovery", ttl);
        self
    }

    /// Builder: allow plain http issuers on non-loopback hosts
    pub fn require_https(mut self, require: bool) -> Self {
        self.require_https = require;
        self
    }

    /// Fetch (or serve from cache) the discovery document of `issuer`.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::InvalidIssuer`] if `issuer` is not an acceptable
    ///   issuer URL (no request is made)
    /// - [`DiscoveryError::Transport`] if the document cannot be fetched
    /// - [`DiscoveryError::InvalidDiscoveryDocument`] if it fails validation
    pub async fn fetch_discovery_document(
        &self,
        issuer: &str,
    ) -> Result<Arc<DiscoveryDocument>, DiscoveryError> {
        let now = self.clock.now_secs();
        if let Some(cached) = self.cache.get(issuer, now) {
            debug!(issuer = %issuer, "Using cached discovery document");
            return Ok(cached);
        }

        check_issuer(issuer, self.require_https).map_err(|reason| {
            DiscoveryError::InvalidIssuer {
                issuer: issuer.to_string(),
                reason,
            }
        })?;

        let url = well_known_url(issuer);
        debug!(issuer = %issuer, url = %url, "Fetching discovery document");
        let body = self.fetcher.get_json(&url).await.map_err(|e| {
            error!(issuer = %issuer, error = %e, "Discovery fetch failed");
            DiscoveryError::Transport(e)
        })?;

        let document = DiscoveryDocument::from_json(body, issuer).map_err(|errors| {
            warn!(
                issuer = %issuer,
                error_count = errors.len(),
                "Rejected invalid discovery document"
            );
            DiscoveryError::InvalidDiscoveryDocument {
                issuer: issuer.to_string(),
                errors,
            }
        })?;

        info!(
            issuer = %issuer,
            jwks_uri = %document.jwks_uri,
            algorithms = ?document.id_token_signing_alg_values_supported,
            "Loaded discovery document"
        );
        Ok(self.cache.insert(issuer, document, self.clock.now_secs()))
    }

    /// Drop the cached document for `issuer`. Returns true if one existed.
    pub fn invalidate(&self, issuer: &str) -> bool {
        self.cache.invalidate(issuer)
    }

    /// Drop every cached document
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(self.clock.now_secs())
    }
}

impl<F, C> std::fmt::Debug for DiscoveryClient<F, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryClient")
            .field("ttl", &self.cache.ttl())
            .field("cached", &self.cache.len())
            .field("require_https", &self.require_https)
            .finish_non_exhaustive()
    }
}
