use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sessions are stateless; rotating the signing secret is the only way to
/// invalidate tokens before they expire.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// What a session token asserts: account identity and the admin flag as
/// they were at issuance time, plus an absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub privilege: bool,
    pub exp: usize,
}

/// The three ways token verification fails. All collapse to the same
/// unauthenticated response; the kind is logged at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("no bearer token presented")]
    Missing,
    #[error("malformed or badly signed token")]
    Invalid,
    #[error("token expired")]
    Expired,
}

pub fn issue(secret: &str, id: i64, username: &str, privilege: bool) -> anyhow::Result<String> {
    let claims = Claims {
        sub: id,
        username: username.to_string(),
        privilege,
        exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify(secret: &str, token: &str) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(TokenError::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key";

    #[test]
    fn issue_verify_roundtrip_carries_all_claims() {
        let token = issue(SECRET, 7, "alice", true).unwrap();
        let claims = verify(SECRET, &token).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "alice");
        assert!(claims.privilege);
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert_eq!(verify(SECRET, "not.a.token"), Err(TokenError::Invalid));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issue("secret-one", 1, "alice", false).unwrap();
        assert_eq!(verify("secret-two", &token), Err(TokenError::Invalid));
    }

    #[test]
    fn past_expiry_is_expired_not_invalid() {
        // Two hours back clears jsonwebtoken's default 60s leeway.
        let claims = Claims {
            sub: 1,
            username: "alice".to_string(),
            privilege: false,
            exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify(SECRET, &token), Err(TokenError::Expired));
    }

    #[test]
    fn header_extraction_distinguishes_missing() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(TokenError::Missing));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic YWxhZGRpbg==".parse().unwrap());
        assert_eq!(bearer_token(&headers), Err(TokenError::Missing));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok("abc123"));
    }
}
