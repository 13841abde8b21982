//! In-memory fetcher and crypto backend for unit tests.

use crate::error::{CryptoError, TransportError};
use crate::jwks::Jwk;
use crate::jwt::Algorithm;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::future::{Future, pending, ready};
use std::sync::Mutex;

/// Scripted responses per URL. The last response for a URL repeats.
#[derive(Debug, Default)]
pub(crate) struct MockFetcher {
    routes: Mutex<HashMap<String, VecDeque<Result<Value, TransportError>>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockFetcher {
    pub(crate) fn respond(&self, url: &str, response: Result<Value, TransportError>) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub(crate) fn respond_json(&self, url: &str, body: Value) {
        self.respond(url, Ok(body));
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

impl crate::JsonFetcher for MockFetcher {
    fn get_json(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Value, TransportError>> + crate::MaybeSend {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            }),
        };
        ready(response)
    }
}

/// Fetcher whose requests never complete; counts how many were started.
#[derive(Debug, Default)]
pub(crate) struct PendingFetcher {
    pub(crate) started: Mutex<usize>,
}

impl crate::JsonFetcher for PendingFetcher {
    fn get_json(
        &self,
        _url: &str,
    ) -> impl Future<Output = Result<Value, TransportError>> + crate::MaybeSend {
        *self.started.lock().unwrap() += 1;
        pending()
    }
}

/// Imported form of a fake key: the JWK's `n` (RSA) or `x` (EC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeKey {
    pub(crate) material: String,
}

/// A signature verifies iff it equals the key material.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    pub(crate) unsupported: Vec<Algorithm>,
    pub(crate) broken: bool,
}

impl crate::CryptoBackend for FakeBackend {
    type Key = FakeKey;

    fn name(&self) -> &'static str {
        "fake"
    }

    fn supports(&self, alg: Algorithm) -> bool {
        !self.unsupported.contains(&alg)
    }

    fn import_key(&self, jwk: &Jwk) -> Result<FakeKey, CryptoError> {
        let material = if jwk.is_rsa() {
            jwk.n.clone()
        } else if jwk.is_ec() && matches!(jwk.crv.as_deref(), Some("P-256" | "P-384")) {
            jwk.x.clone()
        } else {
            None
        };
        material
            .map(|material| FakeKey { material })
            .ok_or_else(|| CryptoError::new("missing key components"))
    }

    fn verify(
        &self,
        key: &FakeKey,
        _alg: Algorithm,
        _message: &[u8],
        signature: &[u8],
    ) -> impl Future<Output = Result<bool, CryptoError>> + crate::MaybeSend {
        let result = if self.broken {
            Err(CryptoError::new("backend exploded"))
        } else {
            Ok(signature == key.material.as_bytes())
        };
        ready(result)
    }
}

pub(crate) fn rsa_jwk(kid: &str, material: &str) -> Value {
    json!({"kty": "RSA", "kid": kid, "use": "sig", "n": material, "e": "AQAB"})
}

pub(crate) fn ec_jwk(kid: &str, crv: &str, material: &str) -> Value {
    json!({"kty": "EC", "kid": kid, "crv": crv, "x": material, "y": "eQ"})
}

fn b64(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
}

/// A compact token "signed" for [`FakeBackend`] with `material`.
pub(crate) fn fake_token(header: &Value, claims: &Value, material: &str) -> String {
    format!(
        "{}.{}.{}",
        b64(header),
        b64(claims),
        URL_SAFE_NO_PAD.encode(material)
    )
}
