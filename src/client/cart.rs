//! Cart Reconciler.
//!
//! Guests persist the whole cart to device storage after every change.
//! Signing in unions the guest cart into the server cart once; from then on
//! every change is written through to the server as a full replace.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CartBackend, ClientError, DeviceStorage};
use crate::domain::aggregates::{Cart, CartLine};

pub const CART_STORAGE_KEY: &str = "cart";

#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<CartLine>,
}

pub struct CartReconciler {
    storage: Arc<dyn DeviceStorage>,
    backend: Option<Arc<dyn CartBackend>>,
    cart: Cart,
}

impl CartReconciler {
    /// Restore the guest cart from device storage. An unreadable blob starts
    /// an empty cart.
    pub fn load_guest(storage: Arc<dyn DeviceStorage>) -> Result<Self, ClientError> {
        let cart = match storage.get(CART_STORAGE_KEY)? {
            Some(blob) => match serde_json::from_str::<StoredCart>(&blob) {
                Ok(stored) => Cart::from_lines(stored.items.into_iter().filter(|l| l.quantity > 0)).unwrap_or_default(),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable guest cart");
                    Cart::new()
                }
            },
            None => Cart::new(),
        };
        Ok(Self { storage, backend: None, cart })
    }

    pub fn is_signed_in(&self) -> bool { self.backend.is_some() }
    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn items(&self) -> &[CartLine] { self.cart.items() }
    pub fn count(&self) -> u32 { self.cart.count() }

    /// Switch to the server cart, unioned with whatever the guest had.
    /// On failure nothing changes and the guest cart is kept.
    pub async fn sign_in(&mut self, backend: Arc<dyn CartBackend>) -> Result<(), ClientError> {
        let mut merged = backend.fetch_cart().await?;
        if !self.cart.is_empty() {
            merged.merge(&self.cart);
            backend.save_cart(&merged).await?;
        }
        self.storage.remove(CART_STORAGE_KEY)?;
        debug!(lines = merged.line_count(), "Cart switched to server");
        self.cart = merged;
        self.backend = Some(backend);
        Ok(())
    }

    /// Back to an empty guest cart.
    pub fn sign_out(&mut self) -> Result<(), ClientError> {
        self.backend = None;
        self.cart.clear();
        self.storage.remove(CART_STORAGE_KEY)
    }

    pub async fn add_item(&mut self, product_id: Uuid, quantity: u32, color: Option<String>, image: Option<String>) -> Result<(), ClientError> {
        if quantity == 0 {
            return Ok(());
        }
        self.cart.add_item(product_id, quantity, color, image);
        self.persist().await
    }

    pub async fn remove_item(&mut self, product_id: Uuid, color: Option<&str>) -> Result<(), ClientError> {
        if self.cart.remove_item(product_id, color) {
            self.persist().await?;
        }
        Ok(())
    }

    /// Below one behaves like [`CartReconciler::remove_item`].
    pub async fn update_quantity(&mut self, product_id: Uuid, quantity: i64, color: Option<&str>) -> Result<(), ClientError> {
        if self.cart.update_quantity(product_id, quantity, color) {
            self.persist().await?;
        }
        Ok(())
    }

    pub async fn clear(&mut self) -> Result<(), ClientError> {
        self.cart.clear();
        self.persist().await
    }

    async fn persist(&self) -> Result<(), ClientError> {
        match &self.backend {
            Some(backend) => backend.save_cart(&self.cart).await,
            None => self.storage.set(CART_STORAGE_KEY, &serde_json::to_string(&self.cart)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::client::MemoryStorage;

    #[derive(Default)]
    struct FakeBackend {
        cart: Mutex<Cart>,
        saves: AtomicUsize,
        fail: AtomicBool,
    }

    impl FakeBackend {
        fn with_cart(cart: Cart) -> Arc<Self> { Arc::new(Self { cart: Mutex::new(cart), ..Default::default() }) }
        fn stored(&self) -> Cart { self.cart.lock().unwrap().clone() }
    }

    #[async_trait]
    impl CartBackend for FakeBackend {
        async fn fetch_cart(&self) -> Result<Cart, ClientError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Status { status: 500, message: "down".into() });
            }
            Ok(self.stored())
        }

        async fn save_cart(&self, cart: &Cart) -> Result<(), ClientError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Status { status: 500, message: "down".into() });
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.cart.lock().unwrap() = cart.clone();
            Ok(())
        }
    }

    fn black() -> Option<String> { Some("Black".into()) }

    #[tokio::test]
    async fn test_guest_cart_persists_to_device() {
        let storage: Arc<dyn DeviceStorage> = Arc::new(MemoryStorage::new());
        let x = Uuid::now_v7();
        let mut cart = CartReconciler::load_guest(storage.clone()).unwrap();
        cart.add_item(x, 1, black(), None).await.unwrap();
        cart.add_item(x, 2, black(), None).await.unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.count(), 3);

        let reloaded = CartReconciler::load_guest(storage.clone()).unwrap();
        assert_eq!(reloaded.cart(), cart.cart());

        cart.update_quantity(x, 0, Some("Black")).await.unwrap();
        assert!(cart.items().is_empty());
        assert!(CartReconciler::load_guest(storage).unwrap().items().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_blob_starts_empty() {
        let storage: Arc<dyn DeviceStorage> = Arc::new(MemoryStorage::new());
        storage.set(CART_STORAGE_KEY, "{not json").unwrap();
        assert!(CartReconciler::load_guest(storage).unwrap().items().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_unions_guest_and_server_carts() {
        let (x, y, z) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let storage: Arc<dyn DeviceStorage> = Arc::new(MemoryStorage::new());
        let mut cart = CartReconciler::load_guest(storage.clone()).unwrap();
        cart.add_item(x, 1, black(), None).await.unwrap();
        cart.add_item(y, 2, None, None).await.unwrap();

        let server = Cart::from_lines([CartLine::new(x, 2, black(), None), CartLine::new(z, 1, None, None)]).unwrap();
        let backend = FakeBackend::with_cart(server);
        cart.sign_in(backend.clone()).await.unwrap();

        assert!(cart.is_signed_in());
        assert_eq!(cart.count(), 6);
        assert_eq!(cart.items().iter().find(|l| l.product_id == x).map(|l| l.quantity), Some(3));
        assert_eq!(backend.stored(), *cart.cart());
        assert_eq!(storage.get(CART_STORAGE_KEY).unwrap(), None);

        cart.add_item(z, 1, None, None).await.unwrap();
        assert_eq!(backend.saves.load(Ordering::SeqCst), 2);
        assert_eq!(backend.stored().count(), 7);
        assert_eq!(storage.get(CART_STORAGE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_guest_cart() {
        let storage: Arc<dyn DeviceStorage> = Arc::new(MemoryStorage::new());
        let mut cart = CartReconciler::load_guest(storage.clone()).unwrap();
        cart.add_item(Uuid::now_v7(), 1, None, None).await.unwrap();

        let backend = FakeBackend::with_cart(Cart::new());
        backend.fail.store(true, Ordering::SeqCst);
        assert!(cart.sign_in(backend).await.is_err());
        assert!(!cart.is_signed_in());
        assert_eq!(cart.count(), 1);
        assert!(storage.get(CART_STORAGE_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sign_out_resets_to_empty_guest() {
        let storage: Arc<dyn DeviceStorage> = Arc::new(MemoryStorage::new());
        let mut cart = CartReconciler::load_guest(storage).unwrap();
        let backend = FakeBackend::with_cart(Cart::from_lines([CartLine::new(Uuid::now_v7(), 4, None, None)]).unwrap());
        cart.sign_in(backend.clone()).await.unwrap();
        assert_eq!(cart.count(), 4);
        assert_eq!(backend.saves.load(Ordering::SeqCst), 0);

        cart.sign_out().unwrap();
        assert!(!cart.is_signed_in());
        assert_eq!(cart.count(), 0);
        assert_eq!(backend.stored().count(), 4);
    }
}
