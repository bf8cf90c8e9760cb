//! In-process store. One lock guards all collections, so multi-record
//! operations (order placement with stock reservation) are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CartRepository, OrderRepository, Page, ProductQuery, ProductRepository, StoreError, StoreResult, UserRepository};
use crate::domain::aggregates::{Cart, Order, OrderStatus, Product, User};
use crate::domain::value_objects::Email;

#[derive(Default)]
struct Collections {
    products: HashMap<Uuid, Product>,
    users: HashMap<Uuid, User>,
    carts: HashMap<Uuid, Cart>,
    orders: HashMap<Uuid, Order>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

fn len_u64(len: usize) -> u64 { u64::try_from(len).unwrap_or(u64::MAX) }

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.inner.write().await.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let db = self.inner.read().await;
        let mut seen = Vec::with_capacity(ids.len());
        Ok(ids
            .iter()
            .filter(|id| if seen.contains(*id) { false } else { seen.push(**id); true })
            .filter_map(|id| db.products.get(id).cloned())
            .collect())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.products.get_mut(&product.id()) {
            Some(stored) => { *stored = product.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.products.remove(&id).is_some())
    }

    async fn search_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>> {
        let db = self.inner.read().await;
        let mut matching: Vec<&Product> = db.products.values().filter(|p| query.matches(p)).collect();
        matching.sort_by(|a, b| query.sort.compare(a, b));
        let total = len_u64(matching.len());
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let page_size = usize::try_from(query.page_size()).unwrap_or(usize::MAX);
        let items = matching.into_iter().skip(offset).take(page_size).cloned().collect();
        Ok(Page::new(items, total, query.page(), query.page_size()))
    }

    async fn count_products(&self) -> StoreResult<u64> {
        Ok(len_u64(self.inner.read().await.products.len()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.users.values().any(|u| u.email() == user.email()) {
            return Err(StoreError::Conflict("email already exists".to_owned()));
        }
        db.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.values().find(|u| u.email() == email).cloned())
    }

    async fn update_profile(&self, user: &User) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.users.get_mut(&user.id()) {
            Some(stored) => { stored.update_profile(user.name(), user.address().clone()); Ok(true) }
            None => Ok(false),
        }
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.inner.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| b.id().cmp(&a.id())));
        Ok(users)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(len_u64(self.inner.read().await.users.len()))
    }

    async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Vec<Uuid>>> {
        let mut db = self.inner.write().await;
        Ok(db.users.get_mut(&user_id).map(|user| {
            if !user.wishlist().contains(product_id) { user.wishlist_mut().add(product_id); }
            user.wishlist().ids().to_vec()
        }))
    }

    async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Vec<Uuid>>> {
        let mut db = self.inner.write().await;
        Ok(db.users.get_mut(&user_id).map(|user| {
            if user.wishlist().contains(product_id) { user.wishlist_mut().remove(product_id); }
            user.wishlist().ids().to_vec()
        }))
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn cart_for(&self, user_id: Uuid) -> StoreResult<Cart> {
        Ok(self.inner.read().await.carts.get(&user_id).cloned().unwrap_or_default())
    }

    async fn replace_cart(&self, user_id: Uuid, cart: &Cart) -> StoreResult<()> {
        self.inner.write().await.carts.insert(user_id, cart.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place_order(&self, order: &Order) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        let reservations = order.reservations();
        for (product_id, qty) in &reservations {
            let available = db.products.get(product_id).map_or(0, Product::stock);
            if available < *qty { return Err(StoreError::InsufficientStock(*product_id)); }
        }
        for (product_id, qty) in reservations {
            if let Some(product) = db.products.get_mut(&product_id) {
                product.reserve(qty).map_err(|_| StoreError::InsufficientStock(product_id))?;
            }
        }
        db.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, page: u32, page_size: u32) -> StoreResult<Page<Order>> {
        let db = self.inner.read().await;
        let mut orders: Vec<&Order> = db.orders.values().collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| b.id().cmp(&a.id())));
        let (page, page_size) = (page.max(1), page_size.max(1));
        let offset = usize::try_from(u64::from(page - 1) * u64::from(page_size)).unwrap_or(usize::MAX);
        let total = len_u64(orders.len());
        let items = orders.into_iter().skip(offset).take(page_size as usize).cloned().collect();
        Ok(Page::new(items, total, page, page_size))
    }

    async fn orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.inner.read().await.orders.values().filter(|o| o.user_id() == Some(user_id)).cloned().collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| b.id().cmp(&a.id())));
        Ok(orders)
    }

    async fn save_transition(&self, order: &Order, from: OrderStatus) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        let Some(stored) = db.orders.get_mut(&order.id()) else { return Ok(false) };
        if stored.status() != from { return Ok(false); }
        *stored = order.clone();
        if order.status() == OrderStatus::Cancelled {
            for (product_id, qty) in order.reservations() {
                if let Some(product) = db.products.get_mut(&product_id) { product.release(qty); }
            }
        }
        Ok(true)
    }

    async fn count_orders(&self) -> StoreResult<u64> {
        Ok(len_u64(self.inner.read().await.orders.len()))
    }
}
