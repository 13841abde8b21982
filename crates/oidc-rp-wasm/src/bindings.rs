//! JavaScript API.

use crate::{WasmOidcClient, new_client};
use oidc_rp_core::{Error, OidcConfig};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// ID token verifier for JavaScript callers.
///
/// Rejections are `Error` objects named `OidcError` with a `kind` property:
/// the snake_case validation failure (`token_expired`, `unknown_key_id`, ...)
/// or `discovery` / `jwks` for provider failures.
#[wasm_bindgen]
pub struct OidcVerifier {
    client: WasmOidcClient,
}

#[wasm_bindgen]
impl OidcVerifier {
    /// Create a verifier; `config` takes the `OidcConfig` fields
    /// (`leeway`, `jwks_ttl`, `key_rotation`, ...) and may be omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<OidcVerifier, JsValue> {
        let config: OidcConfig = if config.is_undefined() || config.is_null() {
            OidcConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| js_error("config", &e.to_string()))?
        };
        let client = new_client(config).map_err(|e| js_error("crypto", &e.to_string()))?;
        Ok(Self { client })
    }

    /// Validate an ID token issued by `issuer` for `audience`; resolves to its claims
    #[wasm_bindgen(js_name = "validateIdToken")]
    pub async fn validate_id_token(
        &self,
        token: String,
        issuer: String,
        audience: String,
        nonce: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let mut opts = self.client.options();
        if let Some(nonce) = nonce {
            opts = opts.with_nonce(nonce);
        }
        let claims = self
            .client
            .validate_id_token(&token, &issuer, &audience, opts)
            .await
            .map_err(|e| to_js_error(&e))?;
        to_js(&claims)
    }

    /// Resolve to the discovery document of `issuer`
    pub async fn discover(&self, issuer: String) -> Result<JsValue, JsValue> {
        let document = self
            .client
            .discover(&issuer)
            .await
            .map_err(|e| to_js_error(&Error::Discovery(e)))?;
        to_js(document.as_ref())
    }

    /// Drop every cached discovery document and key set
    #[wasm_bindgen(js_name = "clearCaches")]
    pub fn clear_caches(&self) {
        self.client.discovery().clear();
        self.client.jwks().clear();
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| js_error("serialization", &e.to_string()))
}

fn to_js_error(err: &Error) -> JsValue {
    let kind = match err {
        Error::Discovery(_) => "discovery",
        Error::Jwks(_) => "jwks",
        Error::Validation(v) => v.kind(),
    };
    js_error(kind, &err.to_string())
}

fn js_error(kind: &str, message: &str) -> JsValue {
    let error = js_sys::Error::new(message);
    error.set_name("OidcError");
    let _ = js_sys::Reflect::set(&error, &"kind".into(), &kind.into());
    error.into()
}
