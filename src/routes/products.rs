use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::aggregates::{Product, ProductDraft};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::state::AppState;
use crate::store::{Page, ProductQuery, ProductSort, DEFAULT_PAGE_SIZE};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl From<ListParams> for ProductQuery {
    fn from(p: ListParams) -> Self {
        Self {
            search: p.q,
            category: p.category,
            min_price: p.min_price,
            max_price: p.max_price,
            sort: ProductSort::parse(p.sort.as_deref()),
            page: p.page.unwrap_or(1),
            page_size: p.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> Result<Json<Page<Product>>> {
    let query = ProductQuery::from(params);
    Ok(Json(state.store().search_products(&query).await?))
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Product>> {
    state.store().product(id).await?.map(Json).ok_or_else(|| AppError::not_found("Product"))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> Result<(StatusCode, Json<Product>)> {
    let mut product = Product::create(draft)?;
    state.store().insert_product(&product).await?;
    info!(product_id = %product.id(), admin = %admin.id, "Product created");
    state.events().publish_all(product.take_events()).await;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> Result<Json<Product>> {
    let mut product = state.store().product(id).await?.ok_or_else(|| AppError::not_found("Product"))?;
    product.replace(draft)?;
    if !state.store().update_product(&product).await? {
        return Err(AppError::not_found("Product"));
    }
    info!(product_id = %id, admin = %admin.id, "Product updated");
    state.events().publish_all(product.take_events()).await;
    Ok(Json(product))
}

pub async fn delete(State(state): State<AppState>, AdminUser(admin): AdminUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Value>> {
    if !state.store().delete_product(id).await? {
        return Err(AppError::not_found("Product"));
    }
    info!(product_id = %id, admin = %admin.id, "Product deleted");
    state.events().publish(&DomainEvent::Product(ProductEvent::Deleted { product_id: id })).await;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

/// Products for a list of ids, in request order. Unknown ids are dropped.
pub async fn batch(State(state): State<AppState>, ApiJson(req): ApiJson<BatchRequest>) -> Result<Json<Value>> {
    let mut products = state.store().products_by_ids(&req.ids).await?;
    products.sort_by_key(|p| req.ids.iter().position(|id| *id == p.id()));
    Ok(Json(json!({ "products": products })))
}
