// src/session/claims.rs — Best-effort decoding of the bearer token's claims
//
// The token stays opaque to the client. Reading its payload only serves
// a consistency check between the token and the user the login response
// returned. Nothing here is verified, so nothing here may grant access.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token is not JWT-shaped: expected 3 segments, got {0}")]
    Shape(usize),
    #[error("token payload is not valid base64url")]
    Base64,
    #[error("token payload is not a JSON object")]
    Json,
}

/// Unverified claims read from a JWT-shaped token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    inner: JsonValue,
}

impl TokenClaims {
    /// The user the token claims to be for: `sub`, else `user_id`, else `id`.
    /// Numeric claims are rendered as strings.
    pub fn subject(&self) -> Option<String> {
        ["sub", "user_id", "id"]
            .iter()
            .filter_map(|key| self.inner.get(*key))
            .find_map(|v| match v {
                JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// Decode the payload segment of a JWT without checking its signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, DecodeError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(DecodeError::Shape(parts.len()));
    }
    // Some issuers pad their segments
    let payload = parts[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| DecodeError::Base64)?;
    let inner: JsonValue = serde_json::from_slice(&bytes).map_err(|_| DecodeError::Json)?;
    if !inner.is_object() {
        return Err(DecodeError::Json);
    }
    Ok(TokenClaims { inner })
}

#[cfg(test)]
pub(crate) fn fake_jwt(payload: &JsonValue) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_sub() {
        let token = fake_jwt(&json!({"sub": "u1", "exp": 1_900_000_000}));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("u1"));
    }

    #[test]
    fn test_subject_falls_back_to_user_id() {
        let token = fake_jwt(&json!({"user_id": 42}));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("42"));
    }

    #[test]
    fn test_no_subject() {
        let token = fake_jwt(&json!({"role": "user"}));
        assert_eq!(decode_claims(&token).unwrap().subject(), None);
    }

    #[test]
    fn test_opaque_token_rejected() {
        assert_eq!(decode_claims("abc").unwrap_err(), DecodeError::Shape(1));
    }

    #[test]
    fn test_bad_base64() {
        assert_eq!(
            decode_claims("a.!!!.c").unwrap_err(),
            DecodeError::Base64
        );
    }

    #[test]
    fn test_payload_not_object() {
        let body = URL_SAFE_NO_PAD.encode("[1,2]");
        assert_eq!(
            decode_claims(&format!("h.{body}.s")).unwrap_err(),
            DecodeError::Json
        );
    }
}
