//! Platform-adaptive marker traits.
//!
//! The fetcher, clock and crypto seams are shared between the native runtime
//! (tokio, multi-threaded) and browser/edge runtimes (wasm32, single-threaded,
//! `JsValue` is `!Send`). On native targets `MaybeSend`/`MaybeSync` require
//! `Send`/`Sync`; on `wasm32` they are blanket-implemented for every type.
//!
//! ```rust,ignore
//! use oidc_rp_core::MaybeSend;
//!
//! trait Fetch {
//!     fn get(&self, url: &str) -> impl Future<Output = String> + MaybeSend;
//! }
//! ```

/// `Send` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}

#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + ?Sized> MaybeSend for T {}

/// `Send` on native targets, no bound on `wasm32`.
#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}

#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSend for T {}

/// `Sync` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSync: Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T: Sync + ?Sized> MaybeSync for T {}

/// `Sync` on native targets, no bound on `wasm32`.
#[cfg(target_arch = "wasm32")]
pub trait MaybeSync {}

#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSync for T {}
