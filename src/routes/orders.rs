use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::{AdminUser, CurrentUser, MaybeUser};
use crate::checkout::{Checkout, CheckoutRequest};
use crate::domain::aggregates::{LineItem, Order, OrderStatus};
use crate::domain::value_objects::ShippingAddress;
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::state::AppState;
use crate::store::Page;

const DEFAULT_ORDERS_PAGE_SIZE: u32 = 20;
const MAX_ORDERS_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    #[serde(flatten)]
    pub line: LineItem,
    /// False once the product has been deleted; the snapshot still renders.
    pub product_available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub items: Vec<LineView>,
    pub total_amount: Decimal,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub status: OrderStatus,
    /// Statuses the back-office may move this order to.
    pub next_statuses: &'static [OrderStatus],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    fn new(order: &Order, live: &HashSet<Uuid>) -> Self {
        Self {
            id: order.id(),
            user_id: order.user_id(),
            items: order
                .items()
                .iter()
                .map(|line| LineView { line: line.clone(), product_available: live.contains(&line.product_id) })
                .collect(),
            total_amount: order.total_amount(),
            shipping_address: order.shipping_address().clone(),
            payment_method: order.payment_method().to_string(),
            status: order.status(),
            next_statuses: order.status().next_states(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

async fn views(state: &AppState, orders: &[Order]) -> Result<Vec<OrderView>> {
    let mut ids: Vec<Uuid> = orders.iter().flat_map(|o| o.items().iter().map(|l| l.product_id)).collect();
    ids.sort_unstable();
    ids.dedup();
    let live: HashSet<Uuid> = state.store().products_by_ids(&ids).await?.iter().map(|p| p.id()).collect();
    Ok(orders.iter().map(|o| OrderView::new(o, &live)).collect())
}

/// Guests may check out; a signed-in customer's order is linked to them.
pub async fn create(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let checkout = Checkout::new(state.store(), state.events(), state.config().price_tolerance);
    let order = checkout.place(session.map(|s| s.id), request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "orderId": order.id() }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<OrderView>>> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(DEFAULT_ORDERS_PAGE_SIZE).clamp(1, MAX_ORDERS_PAGE_SIZE);
    let orders = state.store().list_orders(page, page_size).await?;
    let rendered = views(&state, &orders.items).await?;
    Ok(Json(Page { items: rendered, total_pages: orders.total_pages, current_page: orders.current_page, total_count: orders.total_count }))
}

pub async fn mine(State(state): State<AppState>, CurrentUser(session): CurrentUser) -> Result<Json<Vec<OrderView>>> {
    let orders = state.store().orders_for_user(session.id).await?;
    Ok(Json(views(&state, &orders).await?))
}

/// Admins see every order; customers only their own (others read as 404).
pub async fn get(State(state): State<AppState>, CurrentUser(session): CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<OrderView>> {
    let order = state
        .store()
        .order(id)
        .await?
        .filter(|o| session.is_admin() || o.user_id() == Some(session.id))
        .ok_or_else(|| AppError::not_found("Order"))?;
    let mut rendered = views(&state, std::slice::from_ref(&order)).await?;
    rendered.pop().map(Json).ok_or_else(|| AppError::not_found("Order"))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<OrderView>> {
    let next: OrderStatus = body.status.trim().parse()?;
    let mut order = state.store().order(id).await?.ok_or_else(|| AppError::not_found("Order"))?;
    let from = order.transition(next)?;
    if !state.store().save_transition(&order, from).await? {
        return Err(AppError::BadRequest("Order status was changed by another request; reload and try again".into()));
    }
    info!(order_id = %id, from = %from, to = %next, admin = %admin.id, "Order status changed");
    state.events().publish_all(order.take_events()).await;
    let mut rendered = views(&state, std::slice::from_ref(&order)).await?;
    rendered.pop().map(Json).ok_or_else(|| AppError::not_found("Order"))
}
