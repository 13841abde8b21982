//! JSON Web Keys and imported key sets.

mod client;

pub use client::{DEFAULT_JWKS_TTL, JwksClient};

use crate::error::JwksError;
use crate::jwt::{Algorithm, KeyFamily};
use crate::platform::CryptoBackend;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// A JSON Web Key (JWK) as defined in RFC 7517.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA", "EC")
    pub kty: String,

    /// Key ID (used to match keys in JWKS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Algorithm the key is pinned to (e.g., "RS256", "ES256")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Key use (e.g., "sig" for signature)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    /// RSA modulus (base64url encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA exponent (base64url encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// EC curve (e.g., "P-256", "P-384")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// EC x coordinate (base64url encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// EC y coordinate (base64url encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Symmetric key value (never imported)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
}

impl Jwk {
    /// Check if this is an RSA key
    pub fn is_rsa(&self) -> bool {
        self.kty == "RSA" && self.n.is_some() && self.e.is_some()
    }

    /// Check if this is an EC key
    pub fn is_ec(&self) -> bool {
        self.kty == "EC" && self.crv.is_some() && self.x.is_some() && self.y.is_some()
    }

    /// Check if this is a symmetric (HMAC) key
    pub fn is_symmetric(&self) -> bool {
        self.kty == "oct"
    }

    /// Check if this key can be used for signature verification
    pub fn is_signing_key(&self) -> bool {
        self.use_.as_deref().is_none_or(|u| u == "sig")
    }

    /// Key family, if the key type is one the crate can import
    pub fn family(&self) -> Option<KeyFamily> {
        match self.kty.as_str() {
            "RSA" => Some(KeyFamily::Rsa),
            "EC" => Some(KeyFamily::Ec),
            _ => None,
        }
    }

    /// True if this key can verify `algorithm`.
    ///
    /// RSA keys verify RS* and PS*; EC keys verify only the ES* variant of
    /// their own curve.
    pub fn is_compatible_with_algorithm(&self, algorithm: Algorithm) -> bool {
        match algorithm.key_family() {
            KeyFamily::Rsa => self.is_rsa(),
            KeyFamily::Ec => self.is_ec() && self.crv.as_deref() == algorithm.curve(),
        }
    }

    /// Short description of the key type for error messages
    pub fn describe(&self) -> String {
        match self.crv.as_deref() {
            Some(crv) if self.kty == "EC" => format!("EC ({crv})"),
            _ => self.kty.clone(),
        }
    }
}

/// A JWK Set as served from a `jwks_uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// The keys, in document order
    pub keys: Vec<Jwk>,
}

/// A JWK together with the backend's imported form of it.
#[derive(Debug, Clone)]
pub struct ResolvedKey<K> {
    /// Key ID
    pub kid: String,
    /// The JWK as published
    pub jwk: Jwk,
    /// Imported key, ready for verification
    pub key: K,
}

/// Imported signing keys, indexed by `kid`.
#[derive(Debug, Clone)]
pub struct KeySet<K> {
    keys: Vec<ResolvedKey<K>>,
}

impl<K> Default for KeySet<K> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<K> KeySet<K> {
    /// Look up a key by `kid`
    pub fn get(&self, kid: &str) -> Option<&ResolvedKey<K>> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    /// Key IDs in document order
    pub fn key_ids(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.kid.clone()).collect()
    }

    /// Iterate over the keys
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedKey<K>> {
        self.keys.iter()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if no usable key was published
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Import every usable signing key of a JWK Set document.
    ///
    /// Keys without `kid`, symmetric keys, encryption keys and unsupported
    /// key types are skipped. If a `kid` repeats, the first occurrence wins.
    ///
    /// # Errors
    ///
    /// - [`JwksError::InvalidJwks`] if `value` is not a JWK Set
    /// - [`JwksError::InvalidKey`] if an RSA or EC signing key fails to import
    pub fn from_jwks<B>(jwks_uri: &str, value: Value, backend: &B) -> Result<Self, JwksError>
    where
        B: CryptoBackend<Key = K> + ?Sized,
    {
        let set: JwkSet = serde_json::from_value(value).map_err(|e| JwksError::InvalidJwks {
            jwks_uri: jwks_uri.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_jwk_set(jwks_uri, set, backend)
    }

    /// Import the usable keys of an already-parsed [`JwkSet`].
    ///
    /// # Errors
    ///
    /// [`JwksError::InvalidKey`] if an RSA or EC signing key fails to import.
    pub fn from_jwk_set<B>(jwks_uri: &str, set: JwkSet, backend: &B) -> Result<Self, JwksError>
    where
        B: CryptoBackend<Key = K> + ?Sized,
    {
        let mut keys: Vec<ResolvedKey<K>> = Vec::with_capacity(set.keys.len());

        for jwk in set.keys {
            let Some(kid) = jwk.kid.clone() else {
                warn!(jwks_uri, kty = %jwk.kty, "Skipping JWK without kid");
                continue;
            };
            if jwk.is_symmetric() {
                warn!(jwks_uri, kid, "Skipping symmetric key published in a public JWKS");
                continue;
            }
            if !jwk.is_signing_key() {
                debug!(jwks_uri, kid, use_ = ?jwk.use_, "Skipping non-signing key");
                continue;
            }
            if jwk.family().is_none() {
                debug!(jwks_uri, kid, kty = %jwk.kty, "Skipping unsupported key type");
                continue;
            }
            if keys.iter().any(|k| k.kid == kid) {
                warn!(jwks_uri, kid, "Duplicate kid in JWKS, keeping the first key");
                continue;
            }

            let key = backend
                .import_key(&jwk)
                .map_err(|e| JwksError::InvalidKey {
                    jwks_uri: jwks_uri.to_string(),
                    kid: kid.clone(),
                    reason: e.to_string(),
                })?;
            keys.push(ResolvedKey { kid, jwk, key });
        }

        Ok(Self { keys })
    }
}
