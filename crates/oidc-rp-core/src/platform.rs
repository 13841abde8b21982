//! Runtime seams: HTTP fetch, wall clock and signature crypto.
//!
//! The core never performs I/O or crypto itself. Each runtime supplies a
//! [`JsonFetcher`], a [`Clock`] and a [`CryptoBackend`] when the client is
//! constructed, so there is no global state and no runtime detection.

use crate::error::{CryptoError, TransportError};
use crate::jwks::Jwk;
use crate::jwt::Algorithm;
use crate::marker::{MaybeSend, MaybeSync};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fetches a URL with GET and parses the body as JSON.
///
/// Implementations must apply a timeout and report non-success statuses as
/// [`TransportError::Status`].
pub trait JsonFetcher: MaybeSend + MaybeSync {
    /// GET `url` and parse the response body as JSON
    fn get_json(&self, url: &str)
    -> impl Future<Output = Result<Value, TransportError>> + MaybeSend;
}

/// Source of the current time in seconds since the Unix epoch.
pub trait Clock: MaybeSend + MaybeSync {
    /// Current time, whole seconds since the epoch
    fn now_secs(&self) -> u64;
}

/// Signature verification primitives.
///
/// Keys are imported once when a JWKS is fetched and reused for every token
/// verified against that key set.
pub trait CryptoBackend: MaybeSend + MaybeSync {
    /// Imported public key
    type Key: Clone + fmt::Debug + MaybeSend + MaybeSync + 'static;

    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    /// True if the backend can verify `alg`
    fn supports(&self, alg: Algorithm) -> bool;

    /// Import an RSA or EC public JWK.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] if the key material is missing or unusable.
    fn import_key(&self, jwk: &Jwk) -> Result<Self::Key, CryptoError>;

    /// Verify `signature` over `message`.
    ///
    /// Resolves to `Ok(false)` for a signature that does not verify and
    /// `Err` only when the primitive itself fails.
    fn verify(
        &self,
        key: &Self::Key,
        alg: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> impl Future<Output = Result<bool, CryptoError>> + MaybeSend;
}

impl<T: JsonFetcher + ?Sized> JsonFetcher for Arc<T> {
    fn get_json(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Value, TransportError>> + MaybeSend {
        (**self).get_json(url)
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_secs(&self) -> u64 {
        (**self).now_secs()
    }
}

impl<T: CryptoBackend + ?Sized> CryptoBackend for Arc<T> {
    type Key = T::Key;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn supports(&self, alg: Algorithm) -> bool {
        (**self).supports(alg)
    }

    fn import_key(&self, jwk: &Jwk) -> Result<Self::Key, CryptoError> {
        (**self).import_key(jwk)
    }

    fn verify(
        &self,
        key: &Self::Key,
        alg: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> impl Future<Output = Result<bool, CryptoError>> + MaybeSend {
        (**self).verify(key, alg, message, signature)
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}

/// A clock that only moves when told to. Share it through an `Arc` to drive
/// cache expiry from a test.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Start at `now`
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Move forward by `secs`
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to `now` (may move backwards)
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
