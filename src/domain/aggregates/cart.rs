//! Cart Aggregate

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One cart entry. A cart holds at most one line per (product, color) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLine {
    pub fn new(product_id: Uuid, quantity: u32, color: Option<String>, image: Option<String>) -> Self {
        Self { product_id, quantity, color, image }
    }

    fn matches(&self, product_id: Uuid, color: Option<&str>) -> bool {
        self.product_id == product_id && self.color.as_deref() == color
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Build a cart from submitted lines, folding duplicate pairs together.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Result<Self, CartError> {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 { return Err(CartError::InvalidQuantity { product_id: line.product_id }); }
            cart.add_item(line.product_id, line.quantity, line.color, line.image);
        }
        Ok(cart)
    }

    pub fn items(&self) -> &[CartLine] { &self.items }
    pub fn into_lines(self) -> Vec<CartLine> { self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn line_count(&self) -> usize { self.items.len() }

    /// Total number of units across all lines.
    pub fn count(&self) -> u32 { self.items.iter().fold(0u32, |acc, i| acc.saturating_add(i.quantity)) }

    pub fn product_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.items.iter().map(|i| i.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn add_item(&mut self, product_id: Uuid, quantity: u32, color: Option<String>, image: Option<String>) {
        if quantity == 0 { return; }
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(product_id, color.as_deref())) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            if existing.image.is_none() { existing.image = image; }
        } else {
            self.items.push(CartLine::new(product_id, quantity, color, image));
        }
    }

    /// Drops every line for the pair. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: Uuid, color: Option<&str>) -> bool {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(product_id, color));
        self.items.len() != before
    }

    /// Sets the quantity of a line; anything below one removes it.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i64, color: Option<&str>) -> bool {
        if quantity < 1 { return self.remove_item(product_id, color); }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|i| i.matches(product_id, color)) {
            Some(item) => { item.quantity = quantity; true }
            None => false,
        }
    }

    pub fn clear(&mut self) { self.items.clear(); }

    /// Union with another cart, summing quantities of shared pairs.
    pub fn merge(&mut self, other: &Cart) {
        for line in &other.items {
            self.add_item(line.product_id, line.quantity, line.color.clone(), line.image.clone());
        }
    }

    /// Keep only lines whose product passes the predicate.
    pub fn retain_products(&mut self, mut keep: impl FnMut(Uuid) -> bool) {
        self.items.retain(|i| keep(i.product_id));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Quantity for product {product_id} must be at least 1")]
    InvalidQuantity { product_id: Uuid },
}
