//! Persistence for the four storefront collections: users, products, carts
//! and orders.
//!
//! Handlers only see the repository traits. [`PgStore`] keeps each record as
//! a row with JSONB document columns; [`MemoryStore`] keeps everything behind
//! one lock and backs tests and database-less runs.

mod memory;
mod postgres;
mod query;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use query::{Page, ProductQuery, ProductSort, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Order, OrderStatus, Product, User};
use crate::domain::value_objects::Email;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient stock for product {0}")]
    InsufficientStock(Uuid),

    #[error("Data corruption: {0}")]
    DataCorruption(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    /// Products for the given ids, in no particular order; unknown ids are skipped.
    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>>;
    /// Returns false when no product has that id.
    async fn update_product(&self, product: &Product) -> StoreResult<bool>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
    async fn search_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>>;
    async fn count_products(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>>;
    /// Persists name and address. Returns false when the user is unknown.
    async fn update_profile(&self, user: &User) -> StoreResult<bool>;
    /// Newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn count_users(&self) -> StoreResult<u64>;
    /// Atomically adds to the wishlist. `None` when the user is unknown.
    async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Vec<Uuid>>>;
    async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Vec<Uuid>>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// The persisted cart, empty when none exists yet.
    async fn cart_for(&self, user_id: Uuid) -> StoreResult<Cart>;
    /// Full replace, creating the cart on first write.
    async fn replace_cart(&self, user_id: Uuid, cart: &Cart) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts the order and decrements stock for its lines in one unit.
    /// Fails with [`StoreError::InsufficientStock`] and changes nothing when
    /// any product cannot cover its reservation.
    async fn place_order(&self, order: &Order) -> StoreResult<()>;
    async fn order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    async fn list_orders(&self, page: u32, page_size: u32) -> StoreResult<Page<Order>>;
    async fn orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
    /// Persists `order`'s status only if the stored status is still `from`.
    /// Moving to `cancelled` releases the reserved stock of products that still
    /// exist. Returns false when the stored status had changed.
    async fn save_transition(&self, order: &Order, from: OrderStatus) -> StoreResult<bool>;
    async fn count_orders(&self) -> StoreResult<u64>;
}

/// Everything the service persists.
pub trait Store: ProductRepository + UserRepository + CartRepository + OrderRepository {}

impl<T> Store for T where T: ProductRepository + UserRepository + CartRepository + OrderRepository {}
