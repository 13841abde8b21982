//! JWT header decoding, claims and ID token validation.

mod algorithm;
mod claims;
mod header;
mod validator;

pub use algorithm::{Algorithm, HashAlgorithm, KeyFamily, UnsupportedAlgorithm};
pub use claims::{Audience, IdTokenClaims};
pub use header::{JwtHeader, TokenParts, decode_header, split_token};
pub use validator::{
    PreparedToken, SignatureVerified, ValidationOptions, prepare, token_hash, validate_id_token,
};
