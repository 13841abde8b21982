//! # oidc-rp - OpenID Connect relying party for native targets
//!
//! [`oidc_rp_core`] wired to a reqwest HTTP client, jsonwebtoken signature
//! verification (aws-lc-rs) and the system clock.
//!
//! ```rust,ignore
//! use oidc_rp::{OidcConfig, new_client};
//!
//! let client = new_client(OidcConfig::from_env()?)?;
//! let claims = client
//!     .validate_id_token(&id_token, "https://accounts.example.com", "my-client",
//!         client.options().with_nonce(&nonce))
//!     .await?;
//! println!("signed in: {}", claims.sub);
//! ```
//!
//! For callers that manage key sets themselves, [`validate_id_token`] runs
//! the full validation synchronously against a [`KeySet`].

#![cfg_attr(docsrs, feature(doc_cfg))]

mod clock;
mod crypto;
mod http;

pub use clock::SystemClock;
pub use crypto::{JsonWebTokenBackend, NativeKey};
pub use http::{MAX_RESPONSE_SIZE, ReqwestFetcher};

pub use oidc_rp_core::{
    Algorithm, Audience, CacheStats, Clock, ConfigError, CryptoBackend, CryptoError,
    DiscoveryClient, DiscoveryDocument, DiscoveryError, Error, FieldError, FixedClock,
    IdTokenClaims, JsonFetcher, Jwk, JwkSet, JwksClient, JwksError, JwtHeader, KeyRotationPolicy,
    KeySet, MalformedToken, ManualClock, OidcClient, OidcConfig, ResolvedKey, Result,
    TransportError, ValidationError, ValidationOptions, decode_header, normalize_issuer,
    well_known_url,
};

/// Relying party over reqwest, jsonwebtoken and the system clock
pub type NativeOidcClient = OidcClient<ReqwestFetcher, JsonWebTokenBackend, SystemClock>;

/// Key set imported for [`JsonWebTokenBackend`]
pub type NativeKeySet = KeySet<NativeKey>;

/// Build a [`NativeOidcClient`] from `config`.
///
/// # Errors
///
/// Returns [`TransportError`] if the HTTP client cannot be created.
pub fn new_client(config: OidcConfig) -> std::result::Result<NativeOidcClient, TransportError> {
    let fetcher = ReqwestFetcher::from_config(&config)?;
    Ok(OidcClient::new(fetcher, JsonWebTokenBackend, SystemClock, config))
}

/// Import a JWK Set document into a [`NativeKeySet`].
///
/// `source` names the document in errors and logs.
///
/// # Errors
///
/// Returns [`JwksError`] if the document or one of its signing keys is invalid.
pub fn key_set_from_json(
    source: &str,
    document: serde_json::Value,
) -> std::result::Result<NativeKeySet, JwksError> {
    KeySet::from_jwks(source, document, &JsonWebTokenBackend)
}

/// Validate an ID token synchronously against `keyset`.
///
/// Same checks and error order as [`OidcClient::validate_id_token`], without
/// discovery or key fetching. `now` comes from `opts.now` or the system clock.
///
/// # Errors
///
/// The [`ValidationError`] of the first failing step.
pub fn validate_id_token(
    token: &str,
    keyset: &NativeKeySet,
    expected_issuer: &str,
    expected_audience: &str,
    opts: &ValidationOptions,
) -> std::result::Result<IdTokenClaims, ValidationError> {
    let backend = JsonWebTokenBackend;
    let prepared = oidc_rp_core::jwt::prepare(token, keyset, opts, |alg| backend.supports(alg))?;
    let signature = prepared.signature()?;
    let verified = backend
        .verify_sync(
            &prepared.key().key,
            prepared.algorithm(),
            prepared.signing_input(),
            &signature,
        )
        .map_err(|e| ValidationError::Crypto(e.to_string()))?;

    prepared.signature_verified(verified)?.finish(
        expected_issuer,
        expected_audience,
        opts,
        opts.resolve_now(&SystemClock),
    )
}
