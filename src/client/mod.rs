//! Client-side cart and wishlist stores.
//!
//! A storefront front-end keeps one [`CartReconciler`] and one
//! [`WishlistReconciler`] per device. Guests keep their cart in
//! [`DeviceStorage`]; signing in switches both stores to the server through
//! the backend traits, which [`StorefrontClient`] implements over HTTP.

mod cart;
mod http;
mod storage;
mod wishlist;

pub use cart::{CartReconciler, CART_STORAGE_KEY};
pub use http::StorefrontClient;
pub use storage::{DeviceStorage, FileStorage, MemoryStorage};
pub use wishlist::{Toggle, WishlistError, WishlistReconciler};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::Cart;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Device storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server-side cart of the signed-in user.
#[async_trait]
pub trait CartBackend: Send + Sync {
    async fn fetch_cart(&self) -> Result<Cart, ClientError>;
    /// Full replace.
    async fn save_cart(&self, cart: &Cart) -> Result<(), ClientError>;
}

/// Server-side wishlist of the signed-in user.
#[async_trait]
pub trait WishlistBackend: Send + Sync {
    async fn fetch_wishlist(&self) -> Result<Vec<Uuid>, ClientError>;
    async fn add_to_wishlist(&self, product_id: Uuid) -> Result<(), ClientError>;
    async fn remove_from_wishlist(&self, product_id: Uuid) -> Result<(), ClientError>;
}
