//! # oidc-rp-core - OpenID Connect relying-party core
//!
//! Discovery, JWKS caching and ID token validation for OpenID Connect relying
//! parties, independent of the runtime that performs HTTP and signature
//! verification.
//!
//! ## Architecture
//!
//! - [`discovery`] - `/.well-known/openid-configuration` retrieval, shape
//!   validation and per-issuer caching
//! - [`jwks`] - JWK Set retrieval, key import and per-URI caching
//! - [`jwt`] - header decoding, claims and the ID token validator
//! - [`cache`] - TTL cache shared by both caches
//! - [`platform`] - the [`JsonFetcher`], [`Clock`] and [`CryptoBackend`] seams
//! - [`client`] - [`OidcClient`], composing all of the above
//! - [`config`] - [`OidcConfig`]
//!
//! The native runtime lives in the `oidc-rp` crate (reqwest + jsonwebtoken),
//! the browser/edge runtime in `oidc-rp-wasm` (fetch + Web Crypto).
//!
//! ## Validation order
//!
//! Header, key selection, algorithm gate, signature, claim shape, `exp`/`nbf`,
//! `iss`, `aud`, `nonce`/`at_hash`. The first failing step decides the error;
//! see [`ValidationError`].

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;
pub mod client;
pub mod config;
pub mod discovery;
mod endpoint;
pub mod error;
pub mod jwks;
pub mod jwt;
mod marker;
pub mod platform;
mod shape;

#[cfg(test)]
mod test_support;

pub use cache::{CacheStats, TtlCache};
pub use client::OidcClient;
pub use config::{ConfigError, KeyRotationPolicy, OidcConfig};
pub use discovery::{DiscoveryClient, DiscoveryDocument, normalize_issuer, well_known_url};
pub use error::{
    CryptoError, DiscoveryError, Error, FieldError, JwksError, MalformedToken, Result,
    TransportError, ValidationError,
};
pub use jwks::{Jwk, JwkSet, JwksClient, KeySet, ResolvedKey};
pub use jwt::{
    Algorithm, Audience, IdTokenClaims, JwtHeader, ValidationOptions, decode_header,
    validate_id_token,
};
pub use marker::{MaybeSend, MaybeSync};
pub use platform::{Clock, CryptoBackend, FixedClock, JsonFetcher, ManualClock};
