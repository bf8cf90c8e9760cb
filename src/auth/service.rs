use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::{hash_password, verify_password, AuthError, JwtService, Session};
use crate::config::Config;
use crate::domain::aggregates::User;
use crate::domain::value_objects::{Email, Role, ShippingAddress};
use crate::error::validation_message;
use crate::publisher::EventPublisher;
use crate::store::{Store, StoreError};

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    #[serde(default)]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[serde(default)]
    pub password: String,
    #[validate]
    #[serde(default)]
    pub address: ShippingAddress,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Session,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    jwt: JwtService,
    events: EventPublisher,
    admin_email: Email,
    admin_password_hash: SecretString,
}

impl AuthService {
    pub fn new(config: &Config, store: Arc<dyn Store>, events: EventPublisher) -> Self {
        Self {
            store,
            jwt: JwtService::new(&config.jwt_secret, config.jwt_expiration_minutes),
            events,
            admin_email: config.admin_email.clone(),
            admin_password_hash: config.admin_password_hash.clone(),
        }
    }

    pub fn is_reserved(&self, email: &Email) -> bool { *email == self.admin_email }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let session = if self.is_reserved(&email) {
            self.login_admin(email, password).await?
        } else {
            let user = self.store.user_by_email(&email).await?.ok_or(AuthError::InvalidCredentials)?;
            if !verify_password(password, user.password_hash()) {
                return Err(AuthError::InvalidCredentials);
            }
            if user.is_admin() {
                return Err(AuthError::RoleMismatch);
            }
            Session::from(&user)
        };
        let token = self.jwt.generate_token(&session)?;
        info!(user_id = %session.id, role = %session.role, "User signed in");
        Ok(LoginResponse { token, user: session })
    }

    async fn login_admin(&self, email: Email, password: &str) -> Result<Session, AuthError> {
        if !verify_password(password, self.admin_password_hash.expose_secret()) {
            warn!("Failed sign-in for the reserved admin account");
            return Err(AuthError::InvalidCredentials);
        }
        if let Some(user) = self.store.user_by_email(&email).await? {
            return Ok(Session { role: Role::Admin, ..Session::from(&user) });
        }
        let mut admin = User::provision_admin(email.clone(), self.admin_password_hash.expose_secret().to_string());
        match self.store.insert_user(&admin).await {
            Ok(()) => {
                info!(user_id = %admin.id(), "Provisioned admin account");
                self.events.publish_all(admin.take_events()).await;
                Ok(Session::from(&admin))
            }
            // a concurrent first sign-in created it
            Err(StoreError::Conflict(_)) => {
                let user = self.store.user_by_email(&email).await?.ok_or(AuthError::InvalidCredentials)?;
                Ok(Session { role: Role::Admin, ..Session::from(&user) })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn register(&self, request: SignupRequest) -> Result<User, AuthError> {
        request.validate().map_err(|e| AuthError::Validation(validation_message(&e)))?;
        if let Some(field) = request.address.missing_field() {
            return Err(AuthError::Validation(format!("Invalid shipping address: {field} is required")));
        }
        let email = Email::parse(&request.email).map_err(|_| AuthError::Validation("Invalid email address".into()))?;
        if self.is_reserved(&email) {
            return Err(AuthError::ReservedEmail);
        }
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let hash = hash_password(&request.password).map_err(|e| AuthError::Hashing(e.to_string()))?;
        let mut user = User::register(request.name.trim(), email, hash, request.address);
        match self.store.insert_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(AuthError::UserAlreadyExists),
            Err(e) => return Err(e.into()),
        }
        info!(user_id = %user.id(), "User registered");
        self.events.publish_all(user.take_events()).await;
        Ok(user)
    }

    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        Ok(self.jwt.validate_token(token)?)
    }
}
