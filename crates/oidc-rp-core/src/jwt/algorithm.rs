//! Asymmetric JWS algorithms accepted for ID tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Family of key an algorithm verifies with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// `kty: "RSA"`
    Rsa,
    /// `kty: "EC"`
    Ec,
}

impl KeyFamily {
    /// JWK `kty` value for this family
    pub fn kty(self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ec => "EC",
        }
    }
}

/// Hash function used by an algorithm (and by `at_hash`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// Web Crypto name of the hash
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Digest length in bytes
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// JWS signing algorithms an ID token may be signed with.
///
/// Only asymmetric algorithms exist here: `none` and the HMAC family can
/// never be represented, so a token naming them is refused at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512
    RS512,
    /// RSASSA-PSS with SHA-256
    PS256,
    /// RSASSA-PSS with SHA-384
    PS384,
    /// RSASSA-PSS with SHA-512
    PS512,
    /// ECDSA with P-256 and SHA-256
    ES256,
    /// ECDSA with P-384 and SHA-384
    ES384,
}

impl Algorithm {
    /// Every supported algorithm
    pub const ALL: [Self; 8] = [
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::ES256,
        Self::ES384,
    ];

    /// Returns the algorithm name as used in JWT headers
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
        }
    }

    /// Key family that can verify this algorithm
    pub fn key_family(self) -> KeyFamily {
        match self {
            Self::ES256 | Self::ES384 => KeyFamily::Ec,
            _ => KeyFamily::Rsa,
        }
    }

    /// Required EC curve, for ECDSA algorithms
    pub fn curve(self) -> Option<&'static str> {
        match self {
            Self::ES256 => Some("P-256"),
            Self::ES384 => Some("P-384"),
            _ => None,
        }
    }

    /// Hash function of the algorithm
    pub fn hash(self) -> HashAlgorithm {
        match self {
            Self::RS256 | Self::PS256 | Self::ES256 => HashAlgorithm::Sha256,
            Self::RS384 | Self::PS384 | Self::ES384 => HashAlgorithm::Sha384,
            Self::RS512 | Self::PS512 => HashAlgorithm::Sha512,
        }
    }

    /// True for the RSASSA-PSS family
    pub fn is_pss(self) -> bool {
        matches!(self, Self::PS256 | Self::PS384 | Self::PS512)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `alg` value that is not an accepted ID token algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("algorithm '{name}' is not accepted: {reason}")]
pub struct UnsupportedAlgorithm {
    /// The value as found
    pub name: String,
    /// Why it is refused
    pub reason: &'static str,
}

impl std::str::FromStr for Algorithm {
    type Err = UnsupportedAlgorithm;

    /// Parse a JOSE `alg` value. Matching is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(alg) = Self::ALL.into_iter().find(|a| a.as_str() == s) {
            return Ok(alg);
        }
        let reason = if s.eq_ignore_ascii_case("none") {
            "unsigned tokens are never accepted"
        } else if s.starts_with("HS") {
            "symmetric algorithms cannot be verified with public keys"
        } else {
            "unsupported algorithm"
        };
        Err(UnsupportedAlgorithm {
            name: s.to_string(),
            reason,
        })
    }
}
