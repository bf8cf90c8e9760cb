use std::collections::HashSet;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{CurrentUser, MaybeUser};
use crate::domain::aggregates::{Cart, CartLine};
use crate::error::{ApiJson, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CartBody {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

/// The persisted cart without lines whose product has been deleted.
/// Guests always get an empty cart.
pub async fn get(State(state): State<AppState>, MaybeUser(session): MaybeUser) -> Result<Json<Cart>> {
    let Some(session) = session else {
        return Ok(Json(Cart::new()));
    };
    let cart = state.store().cart_for(session.id).await?;
    Ok(Json(without_deleted(&state, cart).await?))
}

/// Full replace of the signed-in user's cart.
pub async fn replace(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    ApiJson(body): ApiJson<CartBody>,
) -> Result<Json<Cart>> {
    let cart = Cart::from_lines(body.items)?;
    state.store().replace_cart(session.id, &cart).await?;
    debug!(user_id = %session.id, lines = cart.line_count(), "Cart replaced");
    Ok(Json(cart))
}

/// Union of a guest cart with the persisted one, quantities summed per
/// (product, color). Lines for deleted products are dropped from both sides.
pub async fn merge(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    ApiJson(body): ApiJson<CartBody>,
) -> Result<Json<Cart>> {
    let guest = Cart::from_lines(body.items)?;
    let mut cart = state.store().cart_for(session.id).await?;
    cart.merge(&guest);
    let cart = without_deleted(&state, cart).await?;
    state.store().replace_cart(session.id, &cart).await?;
    debug!(user_id = %session.id, lines = cart.line_count(), "Guest cart merged");
    Ok(Json(cart))
}

async fn without_deleted(state: &AppState, mut cart: Cart) -> Result<Cart> {
    let existing: HashSet<Uuid> = state
        .store()
        .products_by_ids(&cart.product_ids())
        .await?
        .iter()
        .map(|p| p.id())
        .collect();
    cart.retain_products(|id| existing.contains(&id));
    Ok(cart)
}
