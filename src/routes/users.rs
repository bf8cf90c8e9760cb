use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::auth::{AdminUser, CurrentUser};
use crate::domain::aggregates::User;
use crate::domain::value_objects::ShippingAddress;
use crate::error::{ApiJson, AppError, Result};
use crate::state::AppState;

/// Every account, newest first. Password hashes are never serialized.
pub async fn list(State(state): State<AppState>, AdminUser(_): AdminUser) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store().list_users().await?))
}

pub async fn me(State(state): State<AppState>, CurrentUser(session): CurrentUser) -> Result<Json<User>> {
    state.store().user_by_id(session.id).await?.map(Json).ok_or_else(|| AppError::not_found("User"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate]
    pub address: ShippingAddress,
}

pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<User>> {
    update.validate()?;
    if let Some(field) = update.address.missing_field() {
        return Err(AppError::BadRequest(format!("Invalid shipping address: {field} is required")));
    }
    let mut user = state.store().user_by_id(session.id).await?.ok_or_else(|| AppError::not_found("User"))?;
    user.update_profile(update.name.trim(), update.address);
    if !state.store().update_profile(&user).await? {
        return Err(AppError::not_found("User"));
    }
    info!(user_id = %session.id, "Profile updated");
    Ok(Json(user))
}
