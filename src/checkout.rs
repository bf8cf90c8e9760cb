//! Order creation.
//!
//! Submitted lines name products and quantities. Prices, names and
//! totals are recomputed from the current catalog; the client's figures are
//! only compared against them. Stock for every line is reserved together
//! with the order insert.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::aggregates::{Cart, LineItem, Order, OrderError, Product};
use crate::domain::value_objects::ShippingAddress;
use crate::publisher::EventPublisher;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub quantity: u32,
    /// Unit price the client displayed
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutLine>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Product {0} is no longer available")]
    UnknownProduct(Uuid),

    #[error("Price of {name} changed to {current}; please review your cart")]
    PriceMismatch { name: String, current: Decimal },

    #[error("Order total {submitted} does not match {computed}")]
    TotalMismatch { submitted: Decimal, computed: Decimal },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Checkout<'a> {
    store: &'a dyn Store,
    events: &'a EventPublisher,
    tolerance: Decimal,
}

impl<'a> Checkout<'a> {
    pub fn new(store: &'a dyn Store, events: &'a EventPublisher, tolerance: Decimal) -> Self {
        Self { store, events, tolerance }
    }

    /// Validate, price, reserve and persist. A signed-in customer's cart is
    /// emptied afterwards.
    pub async fn place(&self, customer: Option<Uuid>, request: CheckoutRequest) -> Result<Order, CheckoutError> {
        Order::check_submission(request.items.len(), &request.shipping_address)?;

        let ids: Vec<Uuid> = request.items.iter().map(|l| l.product_id).collect();
        let catalog: HashMap<Uuid, Product> =
            self.store.products_by_ids(&ids).await?.into_iter().map(|p| (p.id(), p)).collect();

        let items = request
            .items
            .into_iter()
            .map(|line| self.price_line(&catalog, line))
            .collect::<Result<Vec<_>, _>>()?;

        let mut order = Order::place(customer, items, request.shipping_address, request.payment_method)?;
        if let Some(submitted) = request.total_amount {
            if (submitted - order.total_amount()).abs() > self.tolerance {
                return Err(CheckoutError::TotalMismatch { submitted, computed: order.total_amount() });
            }
        }

        self.store.place_order(&order).await?;
        info!(order_id = %order.id(), total = %order.total_amount(), lines = order.items().len(), "Order placed");

        if let Some(user_id) = customer {
            if let Err(e) = self.store.replace_cart(user_id, &Cart::new()).await {
                warn!(%user_id, error = %e, "Failed to clear cart after order");
            }
        }
        self.events.publish_all(order.take_events()).await;
        Ok(order)
    }

    fn price_line(&self, catalog: &HashMap<Uuid, Product>, line: CheckoutLine) -> Result<LineItem, CheckoutError> {
        let product = catalog.get(&line.product_id).ok_or(CheckoutError::UnknownProduct(line.product_id))?;
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity(line.product_id).into());
        }
        let current = product.price();
        if let Some(submitted) = line.price {
            if (submitted - current.amount()).abs() > self.tolerance {
                return Err(CheckoutError::PriceMismatch { name: product.name().to_string(), current: current.amount() });
            }
        }
        let image = line
            .image
            .filter(|i| !i.trim().is_empty())
            .unwrap_or_else(|| product.image_for(line.color.as_deref()).to_string());
        Ok(LineItem {
            product_id: product.id(),
            name: product.name().to_string(),
            quantity: line.quantity,
            price: current,
            color: line.color,
            image: Some(image),
        })
    }
}
