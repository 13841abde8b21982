//! ID token validation with real signatures against fixed key sets.

mod common;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use common::*;
use jsonwebtoken::{Algorithm as JwtAlg, EncodingKey, Header};
use oidc_rp::{Algorithm, ValidationError, ValidationOptions, validate_id_token};
use pretty_assertions::assert_eq;
use serde_json::json;

const ISSUER: &str = "https://idp.example.com";

fn opts() -> ValidationOptions {
    ValidationOptions::new().at(NOW)
}

#[test]
fn rs256_ps256_and_es256_tokens_validate() {
    let keys = key_set(&[(TestKey::RsaA, "rsa"), (TestKey::Ec, "ec")]);
    let body = claims(ISSUER, NOW + 300);

    for (key, kid, alg) in [
        (TestKey::RsaA, "rsa", JwtAlg::RS256),
        (TestKey::RsaA, "rsa", JwtAlg::PS256),
        (TestKey::RsaA, "rsa", JwtAlg::RS512),
        (TestKey::Ec, "ec", JwtAlg::ES256),
    ] {
        let token = mint(key, Some(kid), alg, &body);
        let claims = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts())
            .unwrap_or_else(|e| panic!("{alg:?} token rejected: {e}"));
        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.aud.contains(CLIENT_ID));
    }
}

#[test]
fn expiry_is_checked_around_exp() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let exp = NOW + 10;
    let token = mint(TestKey::RsaA, Some("a"), JwtAlg::RS256, &claims(ISSUER, exp));

    assert!(validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts().at(exp - 1)).is_ok());
    assert!(validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts().at(exp)).is_ok());

    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts().at(exp + 1)).unwrap_err();
    assert_eq!(err, ValidationError::TokenExpired { exp, now: exp + 1 });

    let lenient = opts().at(exp + 1).with_leeway(5);
    assert!(validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &lenient).is_ok());
}

#[test]
fn not_before_is_enforced() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let mut body = claims(ISSUER, NOW + 300);
    body["nbf"] = json!(NOW + 60);
    let token = mint(TestKey::RsaA, Some("a"), JwtAlg::RS256, &body);

    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts()).unwrap_err();
    assert_eq!(err, ValidationError::TokenNotYetValid { nbf: NOW + 60, now: NOW });
}

#[test]
fn signature_from_another_key_is_rejected() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let token = mint(TestKey::RsaB, Some("a"), JwtAlg::RS256, &claims(ISSUER, NOW + 300));

    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts()).unwrap_err();
    assert_eq!(err, ValidationError::SignatureInvalid);
}

#[test]
fn tampered_payload_is_rejected() {
    let keys = key_set(&[(TestKey::Ec, "ec")]);
    let token = mint(TestKey::Ec, Some("ec"), JwtAlg::ES256, &claims(ISSUER, NOW + 300));

    let mut forged = claims(ISSUER, NOW + 300);
    forged["sub"] = json!("admin");
    let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
    let parts: Vec<&str> = token.split('.').collect();
    let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    let err = validate_id_token(&tampered, &keys, ISSUER, CLIENT_ID, &opts()).unwrap_err();
    assert_eq!(err, ValidationError::SignatureInvalid);
}

#[test]
fn unknown_kid_lists_available_keys() {
    let keys = key_set(&[(TestKey::RsaA, "a"), (TestKey::RsaB, "b")]);
    let token = mint(TestKey::RsaA, Some("zz"), JwtAlg::RS256, &claims(ISSUER, NOW + 300));

    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts()).unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnknownKeyId {
            kid: Some("zz".into()),
            available_keys: vec!["a".into(), "b".into()],
        }
    );
}

#[test]
fn hmac_token_signed_with_public_modulus_is_refused() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let mut header = Header::new(JwtAlg::HS256);
    header.kid = Some("a".into());
    let token = jsonwebtoken::encode(
        &header,
        &claims(ISSUER, NOW + 300),
        &EncodingKey::from_secret(RSA_A_N.as_bytes()),
    )
    .unwrap();

    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts()).unwrap_err();
    assert!(matches!(err, ValidationError::AlgorithmNotAllowed { ref alg, .. } if alg == "HS256"));
}

#[test]
fn unsigned_token_is_refused() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","kid":"a"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(ISSUER, NOW + 300)).unwrap());
    let token = format!("{header}.{payload}.");

    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts()).unwrap_err();
    assert!(matches!(err, ValidationError::AlgorithmNotAllowed { ref alg, .. } if alg == "none"));
}

#[test]
fn key_type_must_match_algorithm() {
    let keys = key_set(&[(TestKey::Ec, "ec")]);
    let token = mint(TestKey::RsaA, Some("ec"), JwtAlg::RS256, &claims(ISSUER, NOW + 300));

    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts()).unwrap_err();
    assert!(matches!(err, ValidationError::AlgorithmNotAllowed { .. }));
}

#[test]
fn allowed_algorithm_list_is_honoured() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let token = mint(TestKey::RsaA, Some("a"), JwtAlg::RS256, &claims(ISSUER, NOW + 300));

    let only_ec = opts().with_allowed_algorithms([Algorithm::ES256]);
    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &only_ec).unwrap_err();
    assert!(matches!(err, ValidationError::AlgorithmNotAllowed { .. }));

    let rsa = opts().with_allowed_algorithms([Algorithm::RS256, Algorithm::PS256]);
    assert!(validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &rsa).is_ok());
}

#[test]
fn issuer_and_audience_must_match() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let token = mint(TestKey::RsaA, Some("a"), JwtAlg::RS256, &claims(ISSUER, NOW + 300));

    let err = validate_id_token(&token, &keys, "https://other.example.com", CLIENT_ID, &opts())
        .unwrap_err();
    assert!(matches!(err, ValidationError::IssuerMismatch { .. }));

    // Trailing slash is a different issuer for the iss claim
    let err = validate_id_token(&token, &keys, "https://idp.example.com/", CLIENT_ID, &opts())
        .unwrap_err();
    assert!(matches!(err, ValidationError::IssuerMismatch { .. }));

    let err = validate_id_token(&token, &keys, ISSUER, "someone-else", &opts()).unwrap_err();
    assert_eq!(
        err,
        ValidationError::AudienceMismatch {
            expected: "someone-else".into(),
            actual: vec![CLIENT_ID.into()],
        }
    );
}

#[test]
fn audience_arrays_are_accepted() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let mut body = claims(ISSUER, NOW + 300);
    body["aud"] = json!(["other-api", CLIENT_ID]);
    body["azp"] = json!(CLIENT_ID);
    let token = mint(TestKey::RsaA, Some("a"), JwtAlg::RS256, &body);

    let claims = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts()).unwrap();
    assert_eq!(claims.aud.len(), 2);
    assert_eq!(claims.azp.as_deref(), Some(CLIENT_ID));
}

#[test]
fn nonce_is_compared_when_expected() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let mut body = claims(ISSUER, NOW + 300);
    body["nonce"] = json!("n-0S6_WzA2Mj");
    let token = mint(TestKey::RsaA, Some("a"), JwtAlg::RS256, &body);

    // Not requested: not checked
    assert!(validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts()).is_ok());
    assert!(
        validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts().with_nonce("n-0S6_WzA2Mj"))
            .is_ok()
    );

    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts().with_nonce("replayed"))
        .unwrap_err();
    assert_eq!(
        err,
        ValidationError::NonceMismatch {
            expected: "replayed".into(),
            actual: Some("n-0S6_WzA2Mj".into()),
        }
    );

    let bare = mint(TestKey::RsaA, Some("a"), JwtAlg::RS256, &claims(ISSUER, NOW + 300));
    let err = validate_id_token(&bare, &keys, ISSUER, CLIENT_ID, &opts().with_nonce("expected"))
        .unwrap_err();
    assert!(matches!(err, ValidationError::NonceMismatch { actual: None, .. }));
}

#[test]
fn at_hash_binds_the_access_token() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let access_token = "SlAV32hkKG";
    let mut body = claims(ISSUER, NOW + 300);
    body["at_hash"] = json!(oidc_rp_core::jwt::token_hash(Algorithm::RS256, access_token));
    let token = mint(TestKey::RsaA, Some("a"), JwtAlg::RS256, &body);

    let ok = opts().with_access_token(access_token);
    assert!(validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &ok).is_ok());

    let swapped = opts().with_access_token("another-token");
    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &swapped).unwrap_err();
    assert_eq!(err, ValidationError::AccessTokenHashMismatch);
}

#[test]
fn missing_required_claims_are_reported() {
    let keys = key_set(&[(TestKey::RsaA, "a")]);
    let body = json!({"iss": ISSUER, "aud": CLIENT_ID, "exp": NOW + 300});
    let token = mint(TestKey::RsaA, Some("a"), JwtAlg::RS256, &body);

    let err = validate_id_token(&token, &keys, ISSUER, CLIENT_ID, &opts()).unwrap_err();
    let ValidationError::InvalidClaims { errors } = err else {
        panic!("expected InvalidClaims, got {err:?}");
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"sub"));
    assert!(fields.contains(&"iat"));
}

#[test]
fn symmetric_keys_never_enter_the_key_set() {
    let mut document = jwks(&[(TestKey::RsaA, "a")]);
    document["keys"]
        .as_array_mut()
        .unwrap()
        .push(json!({"kty": "oct", "kid": "shared", "k": "c2VjcmV0"}));

    let keys = oidc_rp::key_set_from_json("test-jwks", document).unwrap();
    assert_eq!(keys.key_ids(), vec!["a".to_string()]);
}
