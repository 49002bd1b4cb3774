// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token precondition checks.
//!
//! The backend issues either an opaque token or a JWT. For JWTs the client
//! reads the `exp` claim from the payload segment and refuses to send a
//! request once it has passed. Signatures are not verified here: the token
//! is the backend's, the client only avoids wasted round-trips.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::Deserialize;
use serde_json::Value;

use super::AuthError;

/// base64url that accepts both padded and unpadded input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims the client cares about. Everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    /// Expiration timestamp (seconds since epoch). Some issuers send it as
    /// a float or a string, so it is read loosely.
    #[serde(default)]
    exp: Option<Value>,
}

/// Read the expiry of a structured token.
///
/// Returns `Ok(None)` for opaque tokens (anything that is not three
/// dot-separated segments). A structured token without a usable `exp`
/// claim is reported as expired.
pub fn token_expiry(token: &str) -> Result<Option<i64>, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Ok(None);
    }

    let payload = URL_SAFE_LENIENT
        .decode(segments[1])
        .map_err(|_| AuthError::MalformedToken)?;
    let claims: TokenClaims =
        serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;

    claims
        .exp
        .as_ref()
        .and_then(exp_seconds)
        .map(Some)
        .ok_or(AuthError::TokenExpired)
}

/// Validate that a token may be attached to a request at `now` (seconds).
pub fn check_bearer_token(token: &str, now: i64) -> Result<(), AuthError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    match token_expiry(token)? {
        Some(exp) if exp < now => Err(AuthError::TokenExpired),
        _ => Ok(()),
    }
}

/// Build the `Authorization` header value for a token, or fail fast.
pub fn bearer_header_value(token: &str, now: i64) -> Result<String, AuthError> {
    check_bearer_token(token, now)?;
    Ok(format!("Bearer {}", token.trim()))
}

fn exp_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const NOW: i64 = 1_700_000_000;

    /// Helper to create an unsigned test JWT with the given claims JSON.
    fn create_test_jwt(claims: &str) -> String {
        let header = r#"{"alg":"HS256","typ":"JWT"}"#;
        format!(
            "{}.{}.fake_signature",
            URL_SAFE_NO_PAD.encode(header.as_bytes()),
            URL_SAFE_NO_PAD.encode(claims.as_bytes())
        )
    }

    fn jwt_expiring_at(exp: i64) -> String {
        create_test_jwt(&format!(r#"{{"sub":"42","exp":{exp}}}"#))
    }

    #[test]
    fn token_one_second_in_the_past_is_expired() {
        let token = jwt_expiring_at(NOW - 1);
        assert_eq!(check_bearer_token(&token, NOW), Err(AuthError::TokenExpired));
    }

    #[test]
    fn token_one_second_in_the_future_is_valid() {
        let token = jwt_expiring_at(NOW + 1);
        assert_eq!(check_bearer_token(&token, NOW), Ok(()));
    }

    #[test]
    fn token_expiring_now_is_still_valid() {
        let token = jwt_expiring_at(NOW);
        assert!(check_bearer_token(&token, NOW).is_ok());
    }

    #[test]
    fn empty_token_is_missing() {
        assert_eq!(check_bearer_token("", NOW), Err(AuthError::MissingToken));
        assert_eq!(check_bearer_token("   ", NOW), Err(AuthError::MissingToken));
    }

    #[test]
    fn opaque_token_has_no_expiry() {
        assert_eq!(token_expiry("opaque-session-token"), Ok(None));
        assert!(check_bearer_token("opaque-session-token", NOW).is_ok());
    }

    #[test]
    fn structured_token_without_exp_is_expired() {
        let token = create_test_jwt(r#"{"sub":"42"}"#);
        assert_eq!(token_expiry(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn undecodable_payload_is_malformed() {
        assert_eq!(
            token_expiry("header.!!not-base64!!.sig"),
            Err(AuthError::MalformedToken)
        );

        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"not json"));
        assert_eq!(token_expiry(&not_json), Err(AuthError::MalformedToken));
    }

    #[test]
    fn padded_payload_is_accepted() {
        use base64::engine::general_purpose::URL_SAFE;

        // 19 bytes of JSON, so the encoding carries a `=` pad
        let claims = format!(r#"{{"exp": {}}}"#, NOW + 60);
        let encoded = URL_SAFE.encode(claims.as_bytes());
        assert!(encoded.ends_with('='));
        let token = format!("h.{encoded}.s");
        assert_eq!(token_expiry(&token), Ok(Some(NOW + 60)));
    }

    #[test]
    fn string_and_float_exp_claims_are_read() {
        let token = create_test_jwt(&format!(r#"{{"exp":"{}"}}"#, NOW + 5));
        assert_eq!(token_expiry(&token), Ok(Some(NOW + 5)));

        let token = create_test_jwt(&format!(r#"{{"exp":{}.0}}"#, NOW + 5));
        assert_eq!(token_expiry(&token), Ok(Some(NOW + 5)));
    }

    #[test]
    fn bearer_header_uses_standard_format() {
        let token = jwt_expiring_at(NOW + 3600);
        let header = bearer_header_value(&token, NOW).unwrap();
        assert_eq!(header, format!("Bearer {token}"));
    }
}
