//! Error types for discovery, key-set retrieval and ID token validation.
//!
//! Each stage has its own error enum so callers can match on exactly the
//! failure they care about; [`Error`] aggregates them for the high-level
//! [`OidcClient`](crate::OidcClient) API.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single field-level problem found while shape-checking a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending member (`"$"` for the document itself)
    pub field: String,
    /// Human readable reason
    pub reason: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure reported by a [`JsonFetcher`](crate::JsonFetcher).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or the connection failed
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// The server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The request did not complete in time
    #[error("request to {url} timed out")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// The body was not valid JSON
    #[error("response from {url} is not valid JSON: {reason}")]
    InvalidBody {
        /// Requested URL
        url: String,
        /// Parse failure
        reason: String,
    },
}

/// Crypto backend failure (key import or signature primitive).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CryptoError(pub String);

impl CryptoError {
    /// Create a crypto error from anything displayable
    pub fn new(message: impl fmt::Display) -> Self {
        Self(message.to_string())
    }
}

/// Errors from [`DiscoveryClient::fetch_discovery_document`](crate::DiscoveryClient::fetch_discovery_document).
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// The issuer is not an acceptable issuer URL
    #[error("invalid issuer URL '{issuer}': {reason}")]
    InvalidIssuer {
        /// Issuer as given by the caller
        issuer: String,
        /// Why it was refused
        reason: String,
    },

    /// The discovery endpoint could not be fetched
    #[error("failed to fetch discovery document: {0}")]
    Transport(#[from] TransportError),

    /// The document failed shape validation
    #[error("invalid discovery document for {issuer}: {}", join_errors(.errors))]
    InvalidDiscoveryDocument {
        /// Issuer whose document was fetched
        issuer: String,
        /// Every problem found, in document order
        errors: Vec<FieldError>,
    },
}

/// Errors from [`JwksClient::fetch_jwks`](crate::JwksClient::fetch_jwks).
#[derive(Debug, Clone, Error)]
pub enum JwksError {
    /// The JWKS URI is not acceptable
    #[error("invalid JWKS URI '{jwks_uri}': {reason}")]
    InvalidUri {
        /// URI as given
        jwks_uri: String,
        /// Why it was refused
        reason: String,
    },

    /// The JWKS endpoint could not be fetched
    #[error("failed to fetch JWKS: {0}")]
    Fetch(#[from] TransportError),

    /// The body is not a JWK set
    #[error("invalid JWKS from {jwks_uri}: {reason}")]
    InvalidJwks {
        /// Source URI
        jwks_uri: String,
        /// Parse failure
        reason: String,
    },

    /// A key of a supported type could not be imported
    #[error("key '{kid}' from {jwks_uri} could not be imported: {reason}")]
    InvalidKey {
        /// Source URI
        jwks_uri: String,
        /// Key ID of the rejected key
        kid: String,
        /// Backend failure
        reason: String,
    },
}

/// The token is not a structurally valid compact JWS.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed token: {0}")]
pub struct MalformedToken(pub String);

impl MalformedToken {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Errors from ID token validation, in the order the checks run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Step 1: the token or its header could not be decoded
    #[error(transparent)]
    MalformedToken(#[from] MalformedToken),

    /// Step 2: no key in the key set matches the header `kid`
    #[error("no key with kid {kid:?} in key set (available: {available_keys:?})")]
    UnknownKeyId {
        /// `kid` from the header, `None` if the header carries none
        kid: Option<String>,
        /// Key IDs present in the key set
        available_keys: Vec<String>,
    },

    /// Step 3: the header algorithm is refused
    #[error("algorithm '{alg}' not allowed: {reason}")]
    AlgorithmNotAllowed {
        /// Algorithm named by the header
        alg: String,
        /// Why it was refused
        reason: String,
    },

    /// Step 4: the signature does not verify
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Step 5: the payload is not a well-formed ID token claim set
    #[error("invalid claims: {}", join_errors(.errors))]
    InvalidClaims {
        /// Every problem found
        errors: Vec<FieldError>,
    },

    /// Step 6: `exp + leeway < now`
    #[error("token expired at {exp} (now {now})")]
    TokenExpired {
        /// `exp` claim
        exp: u64,
        /// Evaluation time
        now: u64,
    },

    /// Step 6: `nbf > now + leeway`
    #[error("token not valid before {nbf} (now {now})")]
    TokenNotYetValid {
        /// `nbf` claim
        nbf: u64,
        /// Evaluation time
        now: u64,
    },

    /// Step 7: `iss` is not the expected issuer
    #[error("issuer mismatch: expected '{expected}', got '{actual}'")]
    IssuerMismatch {
        /// Expected issuer
        expected: String,
        /// `iss` claim
        actual: String,
    },

    /// Step 8: the expected audience is not in `aud`
    #[error("audience mismatch: expected '{expected}', got {actual:?}")]
    AudienceMismatch {
        /// Expected audience (client ID)
        expected: String,
        /// `aud` claim, normalized to a list
        actual: Vec<String>,
    },

    /// Step 9: `nonce` differs from the expected nonce
    #[error("nonce mismatch: expected '{expected}', got {actual:?}")]
    NonceMismatch {
        /// Nonce sent in the authorization request
        expected: String,
        /// `nonce` claim, if any
        actual: Option<String>,
    },

    /// `at_hash` does not match the supplied access token
    #[error("at_hash does not match the access token")]
    AccessTokenHashMismatch,

    /// The crypto backend failed for a reason other than a bad signature
    #[error("crypto backend failure: {0}")]
    Crypto(String),
}

impl ValidationError {
    /// True if the token names a key that is not in the key set.
    ///
    /// Callers that implement key rotation refetch the JWKS once on this
    /// error and retry.
    pub fn is_unknown_key(&self) -> bool {
        matches!(self, Self::UnknownKeyId { .. })
    }

    /// Stable machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedToken(_) => "malformed_token",
            Self::UnknownKeyId { .. } => "unknown_key_id",
            Self::AlgorithmNotAllowed { .. } => "algorithm_not_allowed",
            Self::SignatureInvalid => "signature_invalid",
            Self::InvalidClaims { .. } => "invalid_claims",
            Self::TokenExpired { .. } => "token_expired",
            Self::TokenNotYetValid { .. } => "token_not_yet_valid",
            Self::IssuerMismatch { .. } => "issuer_mismatch",
            Self::AudienceMismatch { .. } => "audience_mismatch",
            Self::NonceMismatch { .. } => "nonce_mismatch",
            Self::AccessTokenHashMismatch => "access_token_hash_mismatch",
            Self::Crypto(_) => "crypto",
        }
    }
}

/// Any failure of the high-level client.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Discovery failed
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Key-set retrieval failed
    #[error(transparent)]
    Jwks(#[from] JwksError),

    /// The token was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<MalformedToken> for Error {
    fn from(err: MalformedToken) -> Self {
        Self::Validation(err.into())
    }
}

/// Result alias for the high-level client
pub type Result<T, E = Error> = std::result::Result<T, E>;
