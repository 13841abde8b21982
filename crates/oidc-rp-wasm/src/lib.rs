//! # oidc-rp-wasm - OpenID Connect relying party for browsers and edge runtimes
//!
//! [`oidc_rp_core`] wired to the Fetch API, Web Crypto (`crypto.subtle`) and
//! `Date.now()`. Everything binds to `globalThis`, so the same build runs in
//! a page, a web worker or an edge worker.
//!
//! From Rust:
//!
//! ```rust,ignore
//! let client = oidc_rp_wasm::new_client(OidcConfig::default())?;
//! let claims = client
//!     .validate_id_token(&id_token, issuer, client_id, client.options())
//!     .await?;
//! ```
//!
//! From JavaScript, through [`OidcVerifier`]:
//!
//! ```javascript
//! const verifier = new OidcVerifier({ leeway: 30 });
//! const claims = await verifier.validateIdToken(idToken, issuer, clientId, nonce);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod params;

#[cfg(target_arch = "wasm32")]
mod bindings;
#[cfg(target_arch = "wasm32")]
mod clock;
#[cfg(target_arch = "wasm32")]
mod crypto;
#[cfg(target_arch = "wasm32")]
mod fetch;

#[cfg(target_arch = "wasm32")]
pub use bindings::OidcVerifier;
#[cfg(target_arch = "wasm32")]
pub use clock::WebClock;
#[cfg(target_arch = "wasm32")]
pub use crypto::WebCryptoBackend;
#[cfg(target_arch = "wasm32")]
pub use fetch::BrowserFetcher;

pub use oidc_rp_core::{
    Algorithm, CryptoError, DiscoveryDocument, Error, IdTokenClaims, KeyRotationPolicy,
    OidcClient, OidcConfig, ValidationError, ValidationOptions,
};

/// Relying party over fetch, Web Crypto and `Date.now()`
#[cfg(target_arch = "wasm32")]
pub type WasmOidcClient = OidcClient<BrowserFetcher, WebCryptoBackend, WebClock>;

/// Build a [`WasmOidcClient`] from `config`.
///
/// # Errors
///
/// Returns [`CryptoError`] if the global scope has no Web Crypto.
#[cfg(target_arch = "wasm32")]
pub fn new_client(config: OidcConfig) -> Result<WasmOidcClient, CryptoError> {
    let backend = WebCryptoBackend::new()?;
    Ok(OidcClient::new(
        BrowserFetcher::from_config(&config),
        backend,
        WebClock,
        config,
    ))
}
