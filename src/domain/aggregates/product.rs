//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{Price, PriceError, Quantity};

/// Image shown for products without variants.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

/// A purchasable visual option: a color label and its image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub image: String,
}

impl Variant {
    pub fn new(color: impl Into<String>, image: impl Into<String>) -> Self {
        Self { color: color.into(), image: image.into() }
    }
}

/// Mutable product fields as submitted by the back-office.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub stock: Option<u32>,
    #[serde(default, alias = "images")]
    pub variants: Vec<Variant>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: Uuid,
    name: String,
    description: String,
    price: Price,
    category: String,
    stock: Quantity,
    variants: Vec<Variant>,
    colors: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Validated field set shared by create, replace and storage rehydration.
struct Fields { name: String, description: String, price: Price, category: String, stock: Quantity, variants: Vec<Variant> }

impl Fields {
    fn from_draft(draft: ProductDraft) -> Result<Self, ProductError> {
        let name = required(draft.name, "name")?;
        let category = required(draft.category, "category")?;
        let price = draft.price.ok_or(ProductError::MissingField("price"))?;
        let price = Price::new(price).map_err(ProductError::InvalidPrice)?;
        if let Some(index) = draft.variants.iter().position(|v| v.color.trim().is_empty() || v.image.trim().is_empty()) {
            return Err(ProductError::IncompleteVariant(index));
        }
        Ok(Self {
            name, category, price,
            description: draft.description.unwrap_or_default(),
            stock: Quantity::new(draft.stock.unwrap_or(0)),
            variants: draft.variants,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ProductError> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).ok_or(ProductError::MissingField(field))
}

impl Product {
    pub fn create(draft: ProductDraft) -> Result<Self, ProductError> {
        let fields = Fields::from_draft(draft)?;
        let now = Utc::now();
        let mut product = Self::assemble(Uuid::now_v7(), fields, now, now);
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: product.id, name: product.name.clone() }));
        Ok(product)
    }

    /// Rehydrate a stored product.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid, name: String, description: String, price: Price, category: String,
        stock: u32, variants: Vec<Variant>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        let fields = Fields { name, description, price, category, stock: Quantity::new(stock), variants };
        Self::assemble(id, fields, created_at, updated_at)
    }

    fn assemble(id: Uuid, f: Fields, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        let colors = f.variants.iter().map(|v| v.color.clone()).collect();
        Self {
            id, name: f.name, description: f.description, price: f.price, category: f.category,
            stock: f.stock, variants: f.variants, colors, created_at, updated_at, events: vec![],
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> Price { self.price }
    pub fn category(&self) -> &str { &self.category }
    pub fn stock(&self) -> u32 { self.stock.value() }
    pub fn variants(&self) -> &[Variant] { &self.variants }
    pub fn colors(&self) -> &[String] { &self.colors }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn primary_image(&self) -> &str {
        self.variants.first().map_or(PLACEHOLDER_IMAGE, |v| v.image.as_str())
    }

    /// Image for a color label, falling back to the primary image.
    pub fn image_for(&self, color: Option<&str>) -> &str {
        color
            .and_then(|c| self.variants.iter().find(|v| v.color.eq_ignore_ascii_case(c)))
            .map_or_else(|| self.primary_image(), |v| v.image.as_str())
    }

    /// Full replace of the mutable fields.
    pub fn replace(&mut self, draft: ProductDraft) -> Result<(), ProductError> {
        let fields = Fields::from_draft(draft)?;
        let (id, created_at) = (self.id, self.created_at);
        let events = std::mem::take(&mut self.events);
        *self = Self::assemble(id, fields, created_at, Utc::now());
        self.events = events;
        self.raise_event(DomainEvent::Product(ProductEvent::Updated { product_id: id }));
        Ok(())
    }

    pub fn reserve(&mut self, qty: u32) -> Result<(), ProductError> {
        self.stock = self.stock.subtract(qty).ok_or(ProductError::InsufficientStock)?;
        self.touch();
        Ok(())
    }

    pub fn release(&mut self, qty: u32) {
        self.stock = self.stock.add(qty);
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),
    #[error("Variant {} needs both a color and an image", .0 + 1)]
    IncompleteVariant(usize),
    #[error("Insufficient stock")]
    InsufficientStock,
}
