//! Web Crypto algorithm parameters and JWK import checks.
//!
//! Everything here is plain data so it can be tested off the browser; the
//! WASM side serializes these structs straight into the dictionaries that
//! `SubtleCrypto.importKey` and `SubtleCrypto.verify` expect.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use oidc_rp_core::jwt::{HashAlgorithm, KeyFamily};
use oidc_rp_core::{Algorithm, CryptoError, Jwk};
use serde::Serialize;

/// `{ name: "SHA-256" }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HashParams {
    /// Web Crypto hash name
    pub name: &'static str,
}

/// Dictionary for `importKey`: `RsaHashedImportParams` or `EcKeyImportParams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportParams {
    /// Algorithm name
    pub name: &'static str,
    /// Hash bound to an RSA key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashParams>,
    /// Curve of an EC key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub named_curve: Option<&'static str>,
}

/// Dictionary for `verify`: `RsaPssParams`, `EcdsaParams` or a bare name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyParams {
    /// Algorithm name
    pub name: &'static str,
    /// Digest of an ECDSA signature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashParams>,
    /// RSA-PSS salt length in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt_length: Option<usize>,
}

fn hash_params(hash: HashAlgorithm) -> HashParams {
    HashParams { name: hash.name() }
}

fn algorithm_name(alg: Algorithm) -> &'static str {
    match alg.key_family() {
        KeyFamily::Ec => "ECDSA",
        KeyFamily::Rsa if alg.is_pss() => "RSA-PSS",
        KeyFamily::Rsa => "RSASSA-PKCS1-v1_5",
    }
}

/// Parameters to import a key for verifying `alg`
pub fn import_params(alg: Algorithm) -> ImportParams {
    match alg.key_family() {
        KeyFamily::Rsa => ImportParams {
            name: algorithm_name(alg),
            hash: Some(hash_params(alg.hash())),
            named_curve: None,
        },
        KeyFamily::Ec => ImportParams {
            name: algorithm_name(alg),
            hash: None,
            named_curve: alg.curve(),
        },
    }
}

/// Parameters to verify an `alg` signature.
///
/// PSS signatures use a salt as long as the digest, as JWS requires.
pub fn verify_params(alg: Algorithm) -> VerifyParams {
    match alg.key_family() {
        KeyFamily::Ec => VerifyParams {
            name: algorithm_name(alg),
            hash: Some(hash_params(alg.hash())),
            salt_length: None,
        },
        KeyFamily::Rsa => VerifyParams {
            name: algorithm_name(alg),
            hash: None,
            salt_length: alg.is_pss().then(|| alg.hash().output_len()),
        },
    }
}

fn require<'a>(jwk: &'a Jwk, name: &str, value: Option<&'a String>) -> Result<&'a str, CryptoError> {
    let value = value
        .map(String::as_str)
        .ok_or_else(|| CryptoError::new(format!("{} key is missing '{name}'", jwk.kty)))?;
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| CryptoError::new(format!("'{name}' is not base64url: {e}")))?;
    Ok(value)
}

/// Check that `jwk` carries usable public key material.
///
/// Web Crypto imports are asynchronous and tied to one algorithm, so the
/// actual import happens at verification time; this catches broken keys
/// when the JWKS is loaded.
///
/// # Errors
///
/// Returns [`CryptoError`] for unsupported key types or curves and for
/// missing or undecodable components.
pub fn check_public_jwk(jwk: &Jwk) -> Result<(), CryptoError> {
    match jwk.kty.as_str() {
        "RSA" => {
            require(jwk, "n", jwk.n.as_ref())?;
            require(jwk, "e", jwk.e.as_ref())?;
        }
        "EC" => {
            match jwk.crv.as_deref() {
                Some("P-256" | "P-384") => {}
                Some(other) => {
                    return Err(CryptoError::new(format!("unsupported curve '{other}'")));
                }
                None => return Err(CryptoError::new("EC key is missing 'crv'")),
            }
            require(jwk, "x", jwk.x.as_ref())?;
            require(jwk, "y", jwk.y.as_ref())?;
        }
        other => return Err(CryptoError::new(format!("unsupported key type '{other}'"))),
    }
    Ok(())
}
