//! HTTP JSON surface.

mod admin;
mod auth;
mod cart;
mod orders;
mod products;
mod users;
mod wishlist;

use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/products", get(products::list).post(products::create))
        .route("/products/batch", post(products::batch))
        .route("/products/:id", get(products::get).put(products::update).delete(products::delete))
        .route("/cart", get(cart::get).post(cart::replace))
        .route("/cart/merge", post(cart::merge))
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/mine", get(orders::mine))
        .route("/orders/:id", get(orders::get))
        .route("/orders/:id/status", patch(orders::update_status))
        .route("/wishlist", get(wishlist::get).post(wishlist::add).delete(wishlist::remove))
        .route("/users", get(users::list))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::session))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/variants/detect", post(admin::detect_variant));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "opensase-storefront" }))
}
