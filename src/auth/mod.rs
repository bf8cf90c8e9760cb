//! Identity and session.
//!
//! Regular accounts sign in against their stored argon2 hash. The reserved
//! administrator email is checked against the configured hash instead and gets
//! a user record provisioned on its first successful sign-in. The role carried
//! in the session token is the only authorization signal.

mod extractor;
mod jwt;
mod password;
mod service;

pub use extractor::{AdminUser, CurrentUser, MaybeUser};
pub use jwt::{Claims, JwtError, JwtService};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, LoginResponse, SignupRequest};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::User;
use crate::domain::value_objects::Role;
use crate::store::StoreError;

/// Identity attached to an authenticated request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self { id: user.id(), email: user.email().to_string(), name: user.name().to_string(), role: user.role() }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account cannot sign in here")]
    RoleMismatch,

    #[error("This email is reserved")]
    ReservedEmail,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid session: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
