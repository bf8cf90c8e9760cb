use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::{CurrentUser, LoginResponse, Session, SignupRequest};
use crate::domain::aggregates::User;
use crate::error::{ApiJson, Result};
use crate::state::AppState;

/// Regular accounts only; the reserved admin email is refused with 403.
pub async fn signup(State(state): State<AppState>, ApiJson(request): ApiJson<SignupRequest>) -> Result<(StatusCode, Json<User>)> {
    let user = state.auth().register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(State(state): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> Result<Json<LoginResponse>> {
    Ok(Json(state.auth().login(&request.email, &request.password).await?))
}

pub async fn session(CurrentUser(session): CurrentUser) -> Json<Session> {
    Json(session)
}
