//! Web Crypto [`CryptoBackend`].

use crate::params::{check_public_jwk, import_params, verify_params};
use oidc_rp_core::{Algorithm, CryptoBackend, CryptoError, Jwk, MaybeSend};
use serde::Serialize;
use std::future::Future;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// Verifies RS*, PS* and ES256/ES384 signatures with `crypto.subtle`.
///
/// Works in window and worker scopes alike: `crypto` is looked up on the
/// global object.
#[derive(Debug, Clone)]
pub struct WebCryptoBackend {
    subtle: web_sys::SubtleCrypto,
}

impl WebCryptoBackend {
    /// Bind to the global `crypto.subtle`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] if the global scope has no Web Crypto.
    pub fn new() -> Result<Self, CryptoError> {
        let crypto = js_sys::Reflect::get(&js_sys::global(), &"crypto".into())
            .ok()
            .and_then(|value| value.dyn_into::<web_sys::Crypto>().ok())
            .ok_or_else(|| CryptoError::new("Web Crypto is not available in this scope"))?;
        Ok(Self {
            subtle: crypto.subtle(),
        })
    }

    async fn import(&self, jwk: &Jwk, alg: Algorithm) -> Result<web_sys::CryptoKey, CryptoError> {
        let usages = js_sys::Array::of1(&JsValue::from_str("verify"));
        let params = to_object(&import_params(alg))?;
        let promise = self
            .subtle
            .import_key_with_object("jwk", &to_web_sys_jwk(jwk), &params, false, &usages)
            .map_err(|e| CryptoError::new(format!("importKey failed: {e:?}")))?;

        JsFuture::from(promise)
            .await
            .map_err(|e| CryptoError::new(format!("key import rejected: {e:?}")))?
            .dyn_into::<web_sys::CryptoKey>()
            .map_err(|_| CryptoError::new("importKey did not return a CryptoKey"))
    }

    async fn verify_signature(
        &self,
        jwk: &Jwk,
        alg: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        let key = self.import(jwk, alg).await?;
        let data = js_sys::Uint8Array::from(message);
        let sig = js_sys::Uint8Array::from(signature);

        let promise = self
            .subtle
            .verify_with_object_and_buffer_source_and_buffer_source(
                &to_object(&verify_params(alg))?,
                &key,
                &sig,
                &data,
            )
            .map_err(|e| CryptoError::new(format!("verify failed: {e:?}")))?;

        let verdict = JsFuture::from(promise)
            .await
            .map_err(|e| CryptoError::new(format!("verification rejected: {e:?}")))?;
        Ok(verdict.as_bool().unwrap_or(false))
    }
}

fn to_object<T: Serialize>(params: &T) -> Result<js_sys::Object, CryptoError> {
    serde_wasm_bindgen::to_value(params)
        .map_err(|e| CryptoError::new(format!("failed to build algorithm parameters: {e}")))?
        .dyn_into::<js_sys::Object>()
        .map_err(|_| CryptoError::new("algorithm parameters are not an object"))
}

fn to_web_sys_jwk(jwk: &Jwk) -> web_sys::JsonWebKey {
    let web_jwk = web_sys::JsonWebKey::new(&jwk.kty);
    if let Some(n) = &jwk.n {
        web_jwk.set_n(n);
    }
    if let Some(e) = &jwk.e {
        web_jwk.set_e(e);
    }
    if let Some(crv) = &jwk.crv {
        web_jwk.set_crv(crv);
    }
    if let Some(x) = &jwk.x {
        web_jwk.set_x(x);
    }
    if let Some(y) = &jwk.y {
        web_jwk.set_y(y);
    }
    web_jwk.set_key_ops(&js_sys::Array::of1(&JsValue::from_str("verify")));
    web_jwk
}

impl CryptoBackend for WebCryptoBackend {
    /// The checked JWK; Web Crypto imports are per algorithm and async
    type Key = Jwk;

    fn name(&self) -> &'static str {
        "webcrypto"
    }

    fn supports(&self, _alg: Algorithm) -> bool {
        true
    }

    fn import_key(&self, jwk: &Jwk) -> Result<Jwk, CryptoError> {
        check_public_jwk(jwk)?;
        Ok(jwk.clone())
    }

    fn verify(
        &self,
        key: &Jwk,
        alg: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> impl Future<Output = Result<bool, CryptoError>> + MaybeSend {
        self.verify_signature(key, alg, message, signature)
    }
}
