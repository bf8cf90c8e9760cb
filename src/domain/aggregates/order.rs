//! Order Aggregate

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Price, ShippingAddress};

pub const DEFAULT_PAYMENT_METHOD: &str = "COD";

/// Line item frozen into an order at creation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> Option<Decimal> { self.price.multiply(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::Pending, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    /// States reachable in one step.
    pub fn next_states(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool { self.next_states().contains(&next) }
    pub fn is_terminal(&self) -> bool { self.next_states().is_empty() }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    user_id: Option<Uuid>,
    items: Vec<LineItem>,
    total_amount: Decimal,
    shipping_address: ShippingAddress,
    payment_method: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Order {
    /// Checks the creation preconditions without building anything.
    pub fn check_submission(item_count: usize, address: &ShippingAddress) -> Result<(), OrderError> {
        if item_count == 0 { return Err(OrderError::NoItems); }
        if let Some(field) = address.missing_field() { return Err(OrderError::IncompleteAddress(field)); }
        Ok(())
    }

    /// Create a pending order. The total is computed from the frozen lines.
    pub fn place(user_id: Option<Uuid>, items: Vec<LineItem>, shipping_address: ShippingAddress, payment_method: Option<String>) -> Result<Self, OrderError> {
        Self::check_submission(items.len(), &shipping_address)?;
        if let Some(line) = items.iter().find(|l| l.quantity == 0) { return Err(OrderError::InvalidQuantity(line.product_id)); }
        let payment_method = payment_method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
        let total_amount = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, l| l.line_total().and_then(|t| acc.checked_add(t)))
            .ok_or(OrderError::TotalOverflow)?;
        let now = Utc::now();
        let mut order = Self {
            id: Uuid::now_v7(), user_id, items, total_amount, shipping_address, payment_method,
            status: OrderStatus::Pending, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: order.id, user_id, total: total_amount }));
        Ok(order)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid, user_id: Option<Uuid>, items: Vec<LineItem>, total_amount: Decimal, shipping_address: ShippingAddress,
        payment_method: String, status: OrderStatus, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, user_id, items, total_amount, shipping_address, payment_method, status, created_at, updated_at, events: vec![] }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Option<Uuid> { self.user_id }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn total_amount(&self) -> Decimal { self.total_amount }
    pub fn shipping_address(&self) -> &ShippingAddress { &self.shipping_address }
    pub fn payment_method(&self) -> &str { &self.payment_method }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Units per product across all lines, used for stock reservation.
    pub fn reservations(&self) -> BTreeMap<Uuid, u32> {
        self.items.iter().fold(BTreeMap::new(), |mut acc, l| {
            let qty = acc.entry(l.product_id).or_insert(0u32);
            *qty = qty.saturating_add(l.quantity);
            acc
        })
    }

    /// Move to `next` if the transition table allows it. Returns the previous status.
    pub fn transition(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        let from = self.status;
        if !from.can_transition_to(next) { return Err(OrderError::IllegalTransition { from, to: next }); }
        self.status = next;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, from, to: next }));
        Ok(from)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    NoItems,
    #[error("Invalid shipping address: {0} is required")]
    IncompleteAddress(&'static str),
    #[error("Quantity for product {0} must be at least 1")]
    InvalidQuantity(Uuid),
    #[error("Cannot change order status from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
    #[error("Order total is too large")]
    TotalOverflow,
}
