//! Compact JWS splitting and unverified header decoding.

use crate::error::MalformedToken;
use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded JOSE header of a compact JWS.
///
/// Nothing here is trusted until the signature has been verified; the header
/// is only used to pick the verification key and algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtHeader {
    /// Signing algorithm as named by the token (not yet checked)
    pub alg: String,

    /// Key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Media type of the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Content type of the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,

    /// Every other header parameter
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// The three segments of a compact JWS, borrowed from the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'a> {
    /// `BASE64URL(header)`
    pub header: &'a str,
    /// `BASE64URL(payload)`
    pub payload: &'a str,
    /// `BASE64URL(signature)`
    pub signature: &'a str,
    /// `header "." payload`, the bytes the signature covers
    pub signing_input: &'a str,
}

/// Split a compact JWS into its segments.
///
/// # Errors
///
/// Returns [`MalformedToken`] unless the token has exactly three
/// dot-separated segments with a non-empty header and payload.
pub fn split_token(token: &str) -> Result<TokenParts<'_>, MalformedToken> {
    let mut segments = token.splitn(4, '.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        let count = token.split('.').count();
        return Err(MalformedToken::new(format!(
            "expected 3 dot-separated segments, found {count}"
        )));
    };

    if header.is_empty() {
        return Err(MalformedToken::new("header segment is empty"));
    }
    if payload.is_empty() {
        return Err(MalformedToken::new("payload segment is empty"));
    }

    Ok(TokenParts {
        header,
        payload,
        signature,
        signing_input: &token[..header.len() + 1 + payload.len()],
    })
}

/// Decode a base64url segment, tolerating trailing `=` padding.
pub(crate) fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    if segment.ends_with('=') {
        URL_SAFE.decode(segment)
    } else {
        URL_SAFE_NO_PAD.decode(segment)
    }
}

/// Decode the header of a compact JWS without verifying anything.
///
/// # Errors
///
/// Returns [`MalformedToken`] if the token does not have three segments,
/// the header is not base64url, is not a JSON object, or lacks a string
/// `alg` member.
pub fn decode_header(token: &str) -> Result<JwtHeader, MalformedToken> {
    let parts = split_token(token)?;

    let bytes = decode_segment(parts.header)
        .map_err(|e| MalformedToken::new(format!("header is not valid base64url: {e}")))?;

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| MalformedToken::new(format!("header is not valid JSON: {e}")))?;

    let Value::Object(object) = value else {
        return Err(MalformedToken::new("header is not a JSON object"));
    };

    match object.get("alg") {
        Some(Value::String(_)) => {}
        Some(_) => return Err(MalformedToken::new("header 'alg' must be a string")),
        None => return Err(MalformedToken::new("header is missing 'alg'")),
    }

    serde_json::from_value(Value::Object(object))
        .map_err(|e| MalformedToken::new(format!("invalid header: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn b64(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    #[test]
    fn decodes_header_fields() {
        let token = format!(
            "{}.{}.c2ln",
            b64(&json!({"alg": "RS256", "kid": "k1", "typ": "JWT", "x5t": "abc"})),
            b64(&json!({"sub": "u"}))
        );
        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, "RS256");
        assert_eq!(header.kid.as_deref(), Some("k1"));
        assert_eq!(header.typ.as_deref(), Some("JWT"));
        assert_eq!(header.additional.get("x5t"), Some(&json!("abc")));
    }

    #[test]
    fn tolerates_padded_segments() {
        // 16 bytes, so the encoding ends in "=="
        let padded = URL_SAFE.encode(br#"{"alg": "ES256"}"#);
        assert!(padded.ends_with('='));
        let header = decode_header(&format!("{padded}.e30.")).unwrap();
        assert_eq!(header.alg, "ES256");
        assert_eq!(header.kid, None);
    }

    #[test]
    fn rejects_wrong_segment_counts() {
        for token in ["", "abc", "a.b", "a.b.c.d", "a.b.c.d.e"] {
            let err = decode_header(token).unwrap_err();
            assert!(err.0.contains("segments"), "{token}: {err}");
        }
    }

    #[test]
    fn rejects_non_object_and_missing_alg() {
        let array = format!("{}.e30.sig", b64(&json!(["RS256"])));
        assert_eq!(
            decode_header(&array).unwrap_err().0,
            "header is not a JSON object"
        );

        let no_alg = format!("{}.e30.sig", b64(&json!({"kid": "k"})));
        assert_eq!(
            decode_header(&no_alg).unwrap_err().0,
            "header is missing 'alg'"
        );

        let numeric = format!("{}.e30.sig", b64(&json!({"alg": 256})));
        assert!(decode_header(&numeric).is_err());
    }

    #[test]
    fn rejects_bad_base64_and_json() {
        assert!(decode_header("!!!.e30.sig").is_err());
        let not_json = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(decode_header(&format!("{not_json}.e30.sig")).is_err());
    }

    #[test]
    fn signing_input_covers_header_and_payload() {
        let parts = split_token("aGVhZA.cGF5.c2ln").unwrap();
        assert_eq!(parts.signing_input, "aGVhZA.cGF5");
        assert_eq!(parts.signature, "c2ln");
    }

    #[test]
    fn empty_signature_segment_splits() {
        let parts = split_token("aGVhZA.cGF5.").unwrap();
        assert_eq!(parts.signature, "");
    }
}
