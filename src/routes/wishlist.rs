use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::domain::aggregates::Product;
use crate::error::{ApiJson, AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistBody {
    #[serde(default)]
    pub product_id: Option<Uuid>,
}

impl WishlistBody {
    fn product_id(&self) -> Result<Uuid> {
        self.product_id.ok_or_else(|| AppError::BadRequest("Product ID is required".into()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistView {
    pub product_ids: Vec<Uuid>,
    /// Live products, in wishlist order. Entries for deleted products are omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
}

pub async fn get(State(state): State<AppState>, CurrentUser(session): CurrentUser) -> Result<Json<WishlistView>> {
    let user = state.store().user_by_id(session.id).await?.ok_or_else(|| AppError::not_found("User"))?;
    let ids = user.wishlist().ids().to_vec();
    let mut products = state.store().products_by_ids(&ids).await?;
    products.sort_by_key(|p| ids.iter().position(|id| *id == p.id()));
    Ok(Json(WishlistView { product_ids: ids, products: Some(products) }))
}

pub async fn add(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    ApiJson(body): ApiJson<WishlistBody>,
) -> Result<Json<WishlistView>> {
    let product_id = body.product_id()?;
    let ids = state.store().add_to_wishlist(session.id, product_id).await?.ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(WishlistView { product_ids: ids, products: None }))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    ApiJson(body): ApiJson<WishlistBody>,
) -> Result<Json<WishlistView>> {
    let product_id = body.product_id()?;
    let ids = state.store().remove_from_wishlist(session.id, product_id).await?.ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(WishlistView { product_ids: ids, products: None }))
}
