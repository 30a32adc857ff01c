//! Signed-token envelope used to carry form state and query results as a
//! single GraphQL scalar.
//!
//! A payload is any JSON object. It is signed as an HS256 JWT without adding
//! registered claims, so decoding yields exactly what was encoded.

use std::fmt;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

/// Untyped flat record as it travels between form state and the API.
pub type Record = Map<String, Value>;

/// Key under which list tokens carry their rows.
pub const QUERY_RESULT_KEY: &str = "queryResult";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("payload must serialize to a JSON object")]
    NotAnObject,
    #[error("failed to encode payload: {0}")]
    Encode(String),
}

impl From<jsonwebtoken::errors::Error> for TokenizeError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Malformed(e.to_string()),
        }
    }
}

/// Encoder/decoder bound to one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.header.alg)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        // Envelopes are transport wrappers, not sessions: no exp/aud/nbf.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Self {
            header: Header::new(Algorithm::HS256),
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Sign `payload` into a compact token.
    pub fn encode<T: Serialize + ?Sized>(&self, payload: &T) -> Result<String, TokenizeError> {
        let value =
            serde_json::to_value(payload).map_err(|e| TokenizeError::Encode(e.to_string()))?;
        if !value.is_object() {
            return Err(TokenizeError::NotAnObject);
        }
        Ok(jsonwebtoken::encode(&self.header, &value, &self.encoding)?)
    }

    /// Verify `token` and deserialize its payload.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenizeError> {
        let data = jsonwebtoken::decode::<T>(token.trim(), &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Decode a list token into its `queryResult` rows.
    ///
    /// A missing or blank token and a payload without `queryResult` both
    /// mean "no rows". Signature and format failures are still reported so
    /// the caller can decide how loudly to degrade.
    pub fn decode_collection(&self, token: Option<&str>) -> Result<Vec<Record>, TokenizeError> {
        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        let mut payload: Record = self.decode(token)?;
        match payload.remove(QUERY_RESULT_KEY) {
            Some(Value::Array(items)) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect()),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(TokenizeError::Malformed(format!(
                "{QUERY_RESULT_KEY} is not an array: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&SecretString::from(secret.to_string()))
    }

    #[test]
    fn test_round_trip_preserves_payload() {
        let codec = codec("s3cret");
        let payload = json!({
            "name": "Wetland",
            "prefixCode": "WET",
            "nested": { "price": 12.5, "tags": ["a", "b"] },
            "empty": null
        });
        let token = codec.encode(&payload).unwrap();
        let decoded: Value = codec.decode(&token).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let token = codec("one").encode(&json!({ "id": 1 })).unwrap();
        let err = codec("two").decode::<Value>(&token).unwrap_err();
        assert_eq!(err, TokenizeError::InvalidSignature);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = codec("k").decode::<Value>("not-a-token").unwrap_err();
        assert!(matches!(err, TokenizeError::Malformed(_)));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let err = codec("k").encode(&json!(["x"])).unwrap_err();
        assert_eq!(err, TokenizeError::NotAnObject);
    }

    #[test]
    fn test_typed_decode_ignores_server_claims() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Category {
            name: String,
        }
        let codec = codec("k");
        let token = codec
            .encode(&json!({ "name": "Upland", "iat": 1_700_000_000 }))
            .unwrap();
        let category: Category = codec.decode(&token).unwrap();
        assert_eq!(category.name, "Upland");
    }

    #[test]
    fn test_decode_collection_is_idempotent() {
        let codec = codec("k");
        let token = codec
            .encode(&json!({ "queryResult": [{ "id": "1" }, { "id": "2" }] }))
            .unwrap();
        let first = codec.decode_collection(Some(&token)).unwrap();
        let second = codec.decode_collection(Some(&token)).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_collection_missing_or_empty_is_empty() {
        let codec = codec("k");
        assert!(codec.decode_collection(None).unwrap().is_empty());
        assert!(codec.decode_collection(Some("  ")).unwrap().is_empty());
        let token = codec.encode(&json!({ "other": 1 })).unwrap();
        assert!(codec.decode_collection(Some(&token)).unwrap().is_empty());
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let rendered = format!("{:?}", codec("top-secret-value"));
        assert!(!rendered.contains("top-secret-value"));
    }
}
