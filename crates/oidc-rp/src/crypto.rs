//! jsonwebtoken-backed [`CryptoBackend`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::errors::ErrorKind;
use oidc_rp_core::{Algorithm, CryptoBackend, CryptoError, Jwk, MaybeSend};
use std::fmt;
use std::future::{Future, ready};
use std::sync::Arc;
use tracing::error;

/// A public key imported into jsonwebtoken.
#[derive(Clone)]
pub struct NativeKey {
    key: Arc<DecodingKey>,
    kty: &'static str,
}

impl NativeKey {
    /// The underlying decoding key
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for NativeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeKey").field("kty", &self.kty).finish_non_exhaustive()
    }
}

/// Verifies RS*, PS* and ES256/ES384 signatures with jsonwebtoken on aws-lc-rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWebTokenBackend;

impl JsonWebTokenBackend {
    /// Verify a signature synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] if the primitive fails for a reason other
    /// than a bad signature.
    pub fn verify_sync(
        &self,
        key: &NativeKey,
        alg: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        // jsonwebtoken takes the signature in its compact (base64url) form
        let encoded = URL_SAFE_NO_PAD.encode(signature);
        match jsonwebtoken::crypto::verify(&encoded, message, &key.key, to_jsonwebtoken(alg)) {
            Ok(valid) => Ok(valid),
            Err(e) => match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::Base64(_) => Ok(false),
                _ => {
                    error!(alg = %alg, error = %e, "Signature primitive failed");
                    Err(CryptoError::new(e))
                }
            },
        }
    }
}

fn to_jsonwebtoken(alg: Algorithm) -> jsonwebtoken::Algorithm {
    match alg {
        Algorithm::RS256 => jsonwebtoken::Algorithm::RS256,
        Algorithm::RS384 => jsonwebtoken::Algorithm::RS384,
        Algorithm::RS512 => jsonwebtoken::Algorithm::RS512,
        Algorithm::PS256 => jsonwebtoken::Algorithm::PS256,
        Algorithm::PS384 => jsonwebtoken::Algorithm::PS384,
        Algorithm::PS512 => jsonwebtoken::Algorithm::PS512,
        Algorithm::ES256 => jsonwebtoken::Algorithm::ES256,
        Algorithm::ES384 => jsonwebtoken::Algorithm::ES384,
    }
}

fn component<'a>(jwk: &'a Jwk, name: &str, value: Option<&'a String>) -> Result<&'a str, CryptoError> {
    value
        .map(String::as_str)
        .ok_or_else(|| CryptoError::new(format!("{} key is missing '{name}'", jwk.kty)))
}

impl CryptoBackend for JsonWebTokenBackend {
    type Key = NativeKey;

    fn name(&self) -> &'static str {
        "jsonwebtoken"
    }

    fn supports(&self, _alg: Algorithm) -> bool {
        true
    }

    fn import_key(&self, jwk: &Jwk) -> Result<NativeKey, CryptoError> {
        let (key, kty) = match jwk.kty.as_str() {
            "RSA" => {
                let n = component(jwk, "n", jwk.n.as_ref())?;
                let e = component(jwk, "e", jwk.e.as_ref())?;
                (DecodingKey::from_rsa_components(n, e), "RSA")
            }
            "EC" => {
                let crv = component(jwk, "crv", jwk.crv.as_ref())?;
                if !matches!(crv, "P-256" | "P-384") {
                    return Err(CryptoError::new(format!("unsupported curve '{crv}'")));
                }
                let x = component(jwk, "x", jwk.x.as_ref())?;
                let y = component(jwk, "y", jwk.y.as_ref())?;
                (DecodingKey::from_ec_components(x, y), "EC")
            }
            other => return Err(CryptoError::new(format!("unsupported key type '{other}'"))),
        };

        let key = key.map_err(|e| {
            error!(kid = ?jwk.kid, error = %e, "Failed to create decoding key from JWK");
            CryptoError::new(e)
        })?;
        Ok(NativeKey {
            key: Arc::new(key),
            kty,
        })
    }

    fn verify(
        &self,
        key: &NativeKey,
        alg: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> impl Future<Output = Result<bool, CryptoError>> + MaybeSend {
        ready(self.verify_sync(key, alg, message, signature))
    }
}
