//! Token issuance/verification and the `AuthUser` extractor guarding the
//! portal endpoints.

pub mod password;

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

pub const TOKEN_ISSUER: &str = "job portal project";
pub const TOKEN_AUDIENCE: &str = "users";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed bearer token")]
    MissingCredentials,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("signing key error: {0}")]
    Key(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and validates the bearer tokens handed out at login.
#[derive(Clone)]
pub struct TokenAuthority {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenAuthority {
    /// HS256 with a shared secret.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(1),
        }
    }

    /// RS256 with a PEM key pair.
    pub fn from_rsa_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, AuthError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| AuthError::Key(format!("invalid RSA private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| AuthError::Key(format!("invalid RSA public key: {e}")))?;
        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding,
            decoding,
            ttl: Duration::hours(1),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn generate_token(&self, subject: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding)?)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(subject = %data.claims.sub, "token validated");
        Ok(data.claims)
    }
}

/// The authenticated caller, extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<TokenAuthority>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenAuthority>::from_ref(state);
        let token = bearer_token(&parts.headers)?;
        let claims = tokens.validate_token(token)?;
        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    match header.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(token.trim())
        }
        _ => Err(AuthError::MissingCredentials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_round_trip() {
        let tokens = TokenAuthority::from_secret("test-secret");
        let token = tokens.generate_token("42").unwrap();

        let claims = tokens.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.aud, TOKEN_AUDIENCE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = TokenAuthority::from_secret("one").generate_token("1").unwrap();
        let result = TokenAuthority::from_secret("two").validate_token(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = TokenAuthority::from_secret("s").with_ttl(Duration::minutes(-5));
        let token = tokens.generate_token("1").unwrap();
        assert!(tokens.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let tokens = TokenAuthority::from_secret("s");
        assert!(tokens.validate_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_invalid_pem_is_key_error() {
        let result = TokenAuthority::from_rsa_pem(b"nope", b"nope");
        assert!(matches!(result, Err(AuthError::Key(_))));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert!(bearer_token(&headers).is_err());
    }
}
