//! Handler-boundary error type.
//!
//! Every route returns `Result<T, AppError>`. Domain and storage errors
//! convert into it with `?`; server-side failures are logged with their
//! detail and reach the client only as a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::auth::{AuthError, JwtError};
use crate::checkout::CheckoutError;
use crate::domain::aggregates::{CartError, OrderError, ProductError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AppError {
    pub fn not_found(what: &str) -> Self { Self::NotFound(format!("{what} not found")) }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(err) => match err {
                StoreError::Conflict(_) | StoreError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
                StoreError::Database(_) | StoreError::DataCorruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidToken(JwtError::GenerationFailed(_)) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::InvalidCredentials | AuthError::RoleMismatch | AuthError::MissingToken | AuthError::InvalidToken(_) => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::ReservedEmail => StatusCode::FORBIDDEN,
                AuthError::UserAlreadyExists | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::Store(_) | AuthError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
            "Internal server error".to_string()
        } else {
            match &self {
                Self::Auth(AuthError::InvalidToken(_)) => "Invalid or expired session".to_string(),
                _ => self.to_string(),
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self { Self::BadRequest(err.to_string()) }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self { Self::BadRequest(err.to_string()) }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self { Self::BadRequest(err.to_string()) }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Store(store) => Self::Store(store),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self { Self::BadRequest(validation_message(&errors)) }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body extractor whose rejections use the `{"error": ...}` shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor with the same rejection shape as [`ApiJson`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// First validation message, walking nested structs in field order.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(name, _)| *name);
    for (field, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    return err.message.as_ref().map_or_else(|| format!("Invalid {field}"), ToString::to_string);
                }
            }
            ValidationErrorsKind::Struct(nested) => return validation_message(nested),
            ValidationErrorsKind::List(items) => {
                if let Some(nested) = items.values().next() {
                    return validation_message(nested);
                }
            }
        }
    }
    "Invalid request".to_string()
}
