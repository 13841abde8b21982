//! Relying-party configuration.

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use std::time::Duration;
use thiserror::Error;

/// What to do when a token names a `kid` missing from the cached key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRotationPolicy {
    /// Fail with `UnknownKeyId`
    #[default]
    Never,
    /// Invalidate the cached JWKS, refetch it once and validate again
    RefetchOnUnknownKid,
}

impl std::str::FromStr for KeyRotationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(Self::Never),
            "refetch_on_unknown_kid" => Ok(Self::RefetchOnUnknownKid),
            other => Err(format!(
                "expected 'never' or 'refetch_on_unknown_kid', got '{other}'"
            )),
        }
    }
}

/// Invalid environment override
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid value '{value}' for {var}: {reason}")]
pub struct ConfigError {
    /// Variable name
    pub var: String,
    /// Offending value
    pub value: String,
    /// Parse failure
    pub reason: String,
}

/// Relying-party configuration.
///
/// Durations are (de)serialized as whole seconds.
///
/// ```rust,ignore
/// let config = OidcConfig::default()
///     .with_leeway(60)
///     .with_key_rotation(KeyRotationPolicy::RefetchOnUnknownKid);
/// ```
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcConfig {
    /// Lifetime of cached discovery documents (default: 1 hour)
    #[serde_as(as = "DurationSeconds<u64>")]
    pub discovery_ttl: Duration,

    /// Lifetime of cached key sets (default: 1 hour)
    #[serde_as(as = "DurationSeconds<u64>")]
    pub jwks_ttl: Duration,

    /// Timeout of each provider request (default: 10 seconds)
    #[serde_as(as = "DurationSeconds<u64>")]
    pub request_timeout: Duration,

    /// Clock skew tolerance in seconds (default: 0)
    pub leeway: u64,

    /// Refuse plain http on non-loopback hosts (default: true)
    pub require_https: bool,

    /// Key rotation policy (default: never refetch)
    pub key_rotation: KeyRotationPolicy,

    /// User-Agent sent with provider requests
    pub user_agent: String,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            discovery_ttl: crate::discovery::DEFAULT_DISCOVERY_TTL,
            jwks_ttl: crate::jwks::DEFAULT_JWKS_TTL,
            request_timeout: Duration::from_secs(10),
            leeway: 0,
            require_https: true,
            key_rotation: KeyRotationPolicy::Never,
            user_agent: format!("oidc-rp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl OidcConfig {
    /// Builder: set the discovery cache TTL
    pub fn with_discovery_ttl(mut self, ttl: Duration) -> Self {
        self.discovery_ttl = ttl;
        self
    }

    /// Builder: set the JWKS cache TTL
    pub fn with_jwks_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_ttl = ttl;
        self
    }

    /// Builder: set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder: set clock skew leeway
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    /// Builder: allow or refuse plain http providers
    pub fn with_require_https(mut self, require: bool) -> Self {
        self.require_https = require;
        self
    }

    /// Builder: set the key rotation policy
    pub fn with_key_rotation(mut self, policy: KeyRotationPolicy) -> Self {
        self.key_rotation = policy;
        self
    }

    /// Builder: set the User-Agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Defaults overridden by environment variables:
    ///
    /// - `OIDC_RP_DISCOVERY_TTL_SECS`
    /// - `OIDC_RP_JWKS_TTL_SECS`
    /// - `OIDC_RP_REQUEST_TIMEOUT_SECS`
    /// - `OIDC_RP_LEEWAY_SECS`
    /// - `OIDC_RP_REQUIRE_HTTPS` (`true` / `false`)
    /// - `OIDC_RP_KEY_ROTATION` (`never` / `refetch_on_unknown_kid`)
    /// - `OIDC_RP_USER_AGENT`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        fn parse<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            var: &str,
        ) -> Result<Option<T>, ConfigError>
        where
            T::Err: std::fmt::Display,
        {
            let Some(value) = lookup(var) else {
                return Ok(None);
            };
            value.trim().parse::<T>().map(Some).map_err(|e| ConfigError {
                var: var.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })
        }

        let mut config = Self::default();
        if let Some(secs) = parse::<u64>(&lookup, "OIDC_RP_DISCOVERY_TTL_SECS")? {
            config.discovery_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&lookup, "OIDC_RP_JWKS_TTL_SECS")? {
            config.jwks_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&lookup, "OIDC_RP_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&lookup, "OIDC_RP_LEEWAY_SECS")? {
            config.leeway = secs;
        }
        if let Some(require) = parse::<bool>(&lookup, "OIDC_RP_REQUIRE_HTTPS")? {
            config.require_https = require;
        }
        if let Some(policy) = parse::<KeyRotationPolicy>(&lookup, "OIDC_RP_KEY_ROTATION")? {
            config.key_rotation = policy;
        }
        if let Some(user_agent) = lookup("OIDC_RP_USER_AGENT") {
            config.user_agent = user_agent;
        }
        Ok(config)
    }
}
