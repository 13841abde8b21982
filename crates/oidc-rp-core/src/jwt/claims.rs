//! ID token claim set.

use crate::error::FieldError;
use crate::shape::{ShapeCheck, numeric_date};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The `aud` claim: a single audience or a list of audiences.
///
/// The original shape is preserved when the claims are serialized again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// `"aud": "client"`
    Single(String),
    /// `"aud": ["client", "other"]`
    Multiple(Vec<String>),
}

impl Audience {
    /// True if `audience` is one of the audiences
    pub fn contains(&self, audience: &str) -> bool {
        self.iter().any(|a| a == audience)
    }

    /// Iterate over the audiences
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let items: &[String] = match self {
            Self::Single(one) => std::slice::from_ref(one),
            Self::Multiple(many) => many,
        };
        items.iter().map(String::as_str)
    }

    /// The audiences as an owned list
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }

    /// Number of audiences
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(many) => many.len(),
        }
    }

    /// Never true for a validated claim set
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Claims of a validated ID token.
///
/// Standard members are typed; everything else the provider put in the
/// token is kept in [`additional`](Self::additional).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer
    pub iss: String,

    /// Subject
    pub sub: String,

    /// Audience(s)
    pub aud: Audience,

    /// Expiration time (seconds since epoch)
    #[serde(deserialize_with = "seconds")]
    pub exp: u64,

    /// Issued at (seconds since epoch)
    #[serde(deserialize_with = "seconds")]
    pub iat: u64,

    /// Not before (seconds since epoch)
    #[serde(
        default,
        deserialize_with = "optional_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub nbf: Option<u64>,

    /// Time of the end-user authentication
    #[serde(
        default,
        deserialize_with = "optional_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub auth_time: Option<u64>,

    /// Nonce echoed from the authorization request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Access token hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,

    /// Code hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_hash: Option<String>,

    /// Authorized party
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    /// Every other claim
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl IdTokenClaims {
    /// Shape-check a decoded payload and convert it into typed claims.
    ///
    /// # Errors
    ///
    /// Returns every field-level problem found.
    pub fn from_json(value: Value) -> Result<Self, Vec<FieldError>> {
        let mut check = ShapeCheck::new(&value, "claim set")?;
        check.required_string("iss");
        check.required_string("sub");
        check.string_or_list("aud");
        check.required_timestamp("exp");
        check.required_timestamp("iat");
        check.optional_timestamp("nbf");
        check.optional_timestamp("auth_time");
        check.optional_string("nonce");
        check.optional_string("at_hash");
        check.optional_string("c_hash");
        check.optional_string("azp");
        check.finish()?;

        serde_json::from_value(value).map_err(|e| vec![FieldError::new("$", e.to_string())])
    }

    /// Look up a non-standard claim
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.additional.get(name)
    }
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    numeric_date(&value).ok_or_else(|| D::Error::custom(format!("invalid NumericDate: {value}")))
}

fn optional_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => numeric_date(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid NumericDate: {value}"))),
    }
}
