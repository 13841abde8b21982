//! ID token validation (OpenID Connect Core 1.0, section 3.1.3.7).
//!
//! Validation runs as a fixed sequence of hard gates, failing on the first
//! one that does not pass:
//!
//! 1. decode the header
//! 2. select the key by `kid`
//! 3. check the algorithm against the allow-list, the backend and the key
//! 4. verify the signature
//! 5. shape-check the claims
//! 6. `exp` / `nbf` against the clock and leeway
//! 7. `iss`
//! 8. `aud`
//! 9. `nonce`, then `at_hash`
//! 10. return the claims
//!
//! Steps 1-3 ([`prepare`]) and 5-10 ([`SignatureVerified::finish`]) are
//! pure. Step 4 is the only one that needs the crypto backend, which may be
//! asynchronous (Web Crypto), so the caller drives it between the two.

use super::algorithm::Algorithm;
use super::claims::IdTokenClaims;
use super::header::{JwtHeader, decode_header, decode_segment, split_token};
use crate::discovery::DiscoveryDocument;
use crate::error::{FieldError, ValidationError};
use crate::jwks::{KeySet, ResolvedKey};
use crate::platform::{Clock, CryptoBackend};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::{debug, warn};

/// Per-call validation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Evaluation time; the injected clock is used when `None`
    pub now: Option<u64>,

    /// Clock skew tolerance in seconds (default: 0)
    pub leeway: u64,

    /// Nonce sent in the authorization request; checked only when set
    pub nonce: Option<String>,

    /// Accepted algorithms; when `None` every supported algorithm is accepted
    pub allowed_algorithms: Option<Vec<Algorithm>>,

    /// Access token issued alongside the ID token, for the `at_hash` check
    pub access_token: Option<String>,
}

impl ValidationOptions {
    /// Options with no nonce, no leeway and the clock's current time
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: evaluate at a fixed time
    pub fn at(mut self, now: u64) -> Self {
        self.now = Some(now);
        self
    }

    /// Builder: set clock skew leeway
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    /// Builder: require this nonce
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Builder: restrict accepted algorithms
    pub fn with_allowed_algorithms(mut self, algorithms: impl Into<Vec<Algorithm>>) -> Self {
        self.allowed_algorithms = Some(algorithms.into());
        self
    }

    /// Builder: accept only what the provider advertises for ID tokens
    pub fn with_discovery_algorithms(self, document: &DiscoveryDocument) -> Self {
        self.with_allowed_algorithms(document.signing_algorithms())
    }

    /// Builder: check `at_hash` against this access token
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Evaluation time: `now` if set, otherwise the clock
    pub fn resolve_now<C: Clock + ?Sized>(&self, clock: &C) -> u64 {
        self.now.unwrap_or_else(|| clock.now_secs())
    }
}

/// A token that passed steps 1-3 and awaits signature verification.
#[derive(Debug)]
pub struct PreparedToken<'a, K> {
    header: JwtHeader,
    algorithm: Algorithm,
    key: &'a ResolvedKey<K>,
    signing_input: &'a str,
    payload: &'a str,
    signature: &'a str,
}

impl<'a, K> PreparedToken<'a, K> {
    /// Decoded (unverified) header
    pub fn header(&self) -> &JwtHeader {
        &self.header
    }

    /// Algorithm the signature must be verified with
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Selected key
    pub fn key(&self) -> &'a ResolvedKey<K> {
        self.key
    }

    /// Bytes the signature covers
    pub fn signing_input(&self) -> &'a [u8] {
        self.signing_input.as_bytes()
    }

    /// Raw signature bytes.
    ///
    /// # Errors
    ///
    /// [`ValidationError::SignatureInvalid`] if the segment is not base64url.
    pub fn signature(&self) -> Result<Vec<u8>, ValidationError> {
        decode_segment(self.signature).map_err(|_| ValidationError::SignatureInvalid)
    }

    /// Step 4 gate: accept the backend's verdict.
    ///
    /// # Errors
    ///
    /// [`ValidationError::SignatureInvalid`] if `verified` is false.
    pub fn signature_verified(self, verified: bool) -> Result<SignatureVerified<'a>, ValidationError> {
        if !verified {
            warn!(
                kid = %self.key.kid,
                alg = %self.algorithm,
                "ID token signature verification failed"
            );
            return Err(ValidationError::SignatureInvalid);
        }
        Ok(SignatureVerified {
            algorithm: self.algorithm,
            payload: self.payload,
        })
    }
}

/// A token whose signature verified; its claims are not checked yet.
#[derive(Debug, Clone, Copy)]
pub struct SignatureVerified<'a> {
    algorithm: Algorithm,
    payload: &'a str,
}

impl SignatureVerified<'_> {
    /// Steps 5-10: decode and check the claims.
    ///
    /// # Errors
    ///
    /// The [`ValidationError`] of the first failing check.
    pub fn finish(
        self,
        expected_issuer: &str,
        expected_audience: &str,
        opts: &ValidationOptions,
        now: u64,
    ) -> Result<IdTokenClaims, ValidationError> {
        // Step 5
        let claims = decode_claims(self.payload)?;

        // Step 6
        if claims.exp.saturating_add(opts.leeway) < now {
            return Err(ValidationError::TokenExpired {
                exp: claims.exp,
                now,
            });
        }
        if let Some(nbf) = claims.nbf
            && nbf > now.saturating_add(opts.leeway)
        {
            return Err(ValidationError::TokenNotYetValid { nbf, now });
        }

        // Step 7
        if claims.iss != expected_issuer {
            return Err(ValidationError::IssuerMismatch {
                expected: expected_issuer.to_string(),
                actual: claims.iss,
            });
        }

        // Step 8
        if !claims.aud.contains(expected_audience) {
            return Err(ValidationError::AudienceMismatch {
                expected: expected_audience.to_string(),
                actual: claims.aud.to_vec(),
            });
        }

        // Step 9
        if let Some(expected) = &opts.nonce
            && claims.nonce.as_deref() != Some(expected.as_str())
        {
            return Err(ValidationError::NonceMismatch {
                expected: expected.clone(),
                actual: claims.nonce,
            });
        }
        if let (Some(access_token), Some(at_hash)) = (&opts.access_token, &claims.at_hash)
            && token_hash(self.algorithm, access_token) != *at_hash
        {
            return Err(ValidationError::AccessTokenHashMismatch);
        }

        debug!(sub = %claims.sub, iss = %claims.iss, "ID token validated");
        Ok(claims)
    }
}

fn decode_claims(payload: &str) -> Result<IdTokenClaims, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidClaims {
        errors: vec![FieldError::new("$", reason)],
    };
    let bytes = decode_segment(payload)
        .map_err(|e| invalid(format!("payload is not valid base64url: {e}")))?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| invalid(format!("payload is not valid JSON: {e}")))?;
    IdTokenClaims::from_json(value).map_err(|errors| ValidationError::InvalidClaims { errors })
}

/// `at_hash` / `c_hash` value for `value`: the left half of its digest under
/// the hash of `alg`, base64url without padding.
pub fn token_hash(alg: Algorithm, value: &str) -> String {
    let digest = match alg.hash() {
        crate::jwt::HashAlgorithm::Sha256 => Sha256::digest(value.as_bytes()).to_vec(),
        crate::jwt::HashAlgorithm::Sha384 => Sha384::digest(value.as_bytes()).to_vec(),
        crate::jwt::HashAlgorithm::Sha512 => Sha512::digest(value.as_bytes()).to_vec(),
    };
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}

/// Steps 1-3: decode the header, select the key and gate the algorithm.
///
/// `supports` reports whether the crypto backend can verify an algorithm.
///
/// # Errors
///
/// - [`ValidationError::MalformedToken`] if the token cannot be decoded
/// - [`ValidationError::UnknownKeyId`] if no key matches the header `kid`
/// - [`ValidationError::AlgorithmNotAllowed`] if the algorithm is refused
pub fn prepare<'a, K>(
    token: &'a str,
    keyset: &'a KeySet<K>,
    opts: &ValidationOptions,
    supports: impl Fn(Algorithm) -> bool,
) -> Result<PreparedToken<'a, K>, ValidationError> {
    // Step 1
    let header = decode_header(token)?;
    let parts = split_token(token)?;

    // Step 2
    let Some(key) = header.kid.as_deref().and_then(|kid| keyset.get(kid)) else {
        warn!(kid = ?header.kid, "ID token names an unknown signing key");
        return Err(ValidationError::UnknownKeyId {
            kid: header.kid.clone(),
            available_keys: keyset.key_ids(),
        });
    };

    // Step 3
    let refuse = |reason: String| ValidationError::AlgorithmNotAllowed {
        alg: header.alg.clone(),
        reason,
    };
    let algorithm: Algorithm = header
        .alg
        .parse()
        .map_err(|e: super::algorithm::UnsupportedAlgorithm| refuse(e.reason.to_string()))?;

    if let Some(allowed) = &opts.allowed_algorithms
        && !allowed.contains(&algorithm)
    {
        return Err(refuse("not in the accepted algorithm list".into()));
    }
    if !supports(algorithm) {
        return Err(refuse("not supported by the crypto backend".into()));
    }
    if !key.jwk.is_compatible_with_algorithm(algorithm) {
        return Err(refuse(format!(
            "key '{}' of type {} cannot verify {algorithm}",
            key.kid,
            key.jwk.describe()
        )));
    }
    if let Some(pinned) = key.jwk.alg.as_deref()
        && pinned != algorithm.as_str()
    {
        return Err(refuse(format!("key '{}' is restricted to {pinned}", key.kid)));
    }

    Ok(PreparedToken {
        header,
        algorithm,
        key,
        signing_input: parts.signing_input,
        payload: parts.payload,
        signature: parts.signature,
    })
}

/// Validate an ID token against a key set.
///
/// `now` comes from `opts.now` or, when unset, from `clock`.
///
/// # Errors
///
/// The [`ValidationError`] of the first failing step.
pub async fn validate_id_token<B, C>(
    backend: &B,
    clock: &C,
    token: &str,
    keyset: &KeySet<B::Key>,
    expected_issuer: &str,
    expected_audience: &str,
    opts: &ValidationOptions,
) -> Result<IdTokenClaims, ValidationError>
where
    B: CryptoBackend + ?Sized,
    C: Clock + ?Sized,
{
    let prepared = prepare(token, keyset, opts, |alg| backend.supports(alg))?;
    let signature = prepared.signature()?;
    let verified = backend
        .verify(
            &prepared.key().key,
            prepared.algorithm(),
            prepared.signing_input(),
            &signature,
        )
        .await
        .map_err(|e| ValidationError::Crypto(e.to_string()))?;

    prepared.signature_verified(verified)?.finish(
        expected_issuer,
        expected_audience,
        opts,
        opts.resolve_now(clock),
    )
}
