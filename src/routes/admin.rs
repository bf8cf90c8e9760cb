use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AdminUser;
use crate::error::{ApiJson, AppError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Stats {
    pub products: u64,
    pub users: u64,
    pub orders: u64,
}

pub async fn stats(State(state): State<AppState>, AdminUser(_): AdminUser) -> Result<Json<Stats>> {
    let store = state.store();
    Ok(Json(Stats {
        products: store.count_products().await?,
        users: store.count_users().await?,
        orders: store.count_orders().await?,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    pub image_url: String,
    /// Zero-based position of the variant in the product's list
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct DetectedVariant {
    pub color: String,
    pub image: String,
}

/// Names an uploaded variant image by its average color. Detection failures
/// degrade to `Variant N` rather than failing the request.
pub async fn detect_variant(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiJson(req): ApiJson<DetectRequest>,
) -> Result<Json<DetectedVariant>> {
    let image = req.image_url.trim().to_string();
    if image.is_empty() {
        return Err(AppError::BadRequest("Image URL is required".into()));
    }
    let color = state.variants().name_for(&image, req.index).await;
    Ok(Json(DetectedVariant { color, image }))
}
