//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_SECRET` - HS256 session signing secret (min 32 chars)
//! - `ADMIN_EMAIL` - Reserved administrator account
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC hash of the administrator password
//!
//! ## Optional
//! - `DATABASE_URL` - `PostgreSQL` connection string (unset: in-memory store)
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8083)
//! - `JWT_EXPIRATION_MINUTES` - Session lifetime, 1 to 525600 (default: 1440)
//! - `NATS_URL` - Publish domain events to NATS when set
//! - `PRICE_TOLERANCE` - Accepted client/server price difference (default: 0.01)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use argon2::PasswordHash;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::domain::value_objects::Email;

const MIN_JWT_SECRET_LENGTH: usize = 32;
/// One year
const MAX_JWT_EXPIRATION_MINUTES: i64 = 525_600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs against the in-memory store
    pub database_url: Option<SecretString>,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_minutes: i64,
    pub admin_email: Email,
    pub admin_password_hash: SecretString,
    pub nats_url: Option<String>,
    pub price_tolerance: Decimal,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::InsecureSecret(
                "JWT_SECRET".to_string(),
                format!("must be at least {MIN_JWT_SECRET_LENGTH} characters"),
            ));
        }

        let admin_email = required("ADMIN_EMAIL")?;
        let admin_email = Email::parse(&admin_email).map_err(|e| invalid("ADMIN_EMAIL", e))?;

        let admin_password_hash = required("ADMIN_PASSWORD_HASH")?;
        PasswordHash::new(&admin_password_hash).map_err(|e| invalid("ADMIN_PASSWORD_HASH", e))?;

        let jwt_expiration_minutes: i64 = parse_or(get("JWT_EXPIRATION_MINUTES"), "JWT_EXPIRATION_MINUTES", 1440)?;
        if !(1..=MAX_JWT_EXPIRATION_MINUTES).contains(&jwt_expiration_minutes) {
            return Err(invalid(
                "JWT_EXPIRATION_MINUTES",
                format!("must be between 1 and {MAX_JWT_EXPIRATION_MINUTES}"),
            ));
        }

        Ok(Self {
            database_url: get("DATABASE_URL").map(SecretString::from),
            host: parse_or(get("HOST"), "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(get("PORT"), "PORT", 8083)?,
            jwt_secret: SecretString::from(jwt_secret),
            jwt_expiration_minutes,
            admin_email,
            admin_password_hash: SecretString::from(admin_password_hash),
            nats_url: get("NATS_URL"),
            price_tolerance: parse_or(get("PRICE_TOLERANCE"), "PRICE_TOLERANCE", Decimal::new(1, 2))?,
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn has_database(&self) -> bool {
        self.database_url.as_ref().is_some_and(|url| !url.expose_secret().is_empty())
    }
}

fn invalid(key: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), err.to_string())
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |v| v.parse::<T>().map_err(|e| invalid(key, e)))
}
