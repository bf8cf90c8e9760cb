//! Session tokens: HS256 JWTs carrying the session identity and role.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Session;
use crate::domain::value_objects::Role;

const ISSUER: &str = "opensase-storefront";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl TryFrom<Claims> for Session {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub).map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        Ok(Session { id, email: claims.email, name: claims.name, role: claims.role })
    }
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

#[derive(Clone)]
pub struct JwtService {
    expiration_minutes: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &SecretString, expiration_minutes: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            expiration_minutes,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn generate_token(&self, session: &Session) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: session.id.to_string(),
            email: session.email.clone(),
            name: session.name.clone(),
            role: session.role,
            exp: (now + Duration::minutes(self.expiration_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Session, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::InvalidToken(e.to_string()),
        })?;
        Session::try_from(data.claims)
    }

    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(minutes: i64) -> JwtService {
        JwtService::new(&SecretString::from("0123456789abcdef0123456789abcdef"), minutes)
    }

    fn session() -> Session {
        Session { id: Uuid::now_v7(), email: "buyer@example.com".into(), name: "Buyer".into(), role: Role::User }
    }

    #[test]
    fn test_round_trip() {
        let jwt = service(60);
        let session = session();
        let token = jwt.generate_token(&session).unwrap();
        assert_eq!(jwt.validate_token(&token).unwrap(), session);
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let token = service(60).generate_token(&session()).unwrap();
        let other = JwtService::new(&SecretString::from("ffffffffffffffffffffffffffffffff"), 60);
        assert!(matches!(other.validate_token(&token), Err(JwtError::InvalidSignature)));

        let expired = service(-10).generate_token(&session()).unwrap();
        assert!(matches!(service(60).validate_token(&expired), Err(JwtError::ExpiredToken)));
        assert!(service(60).validate_token("not-a-token").is_err());
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
    }
}
