//! Wishlist Reconciler.
//!
//! Changes are applied locally first, then persisted. When persisting fails
//! the inverse change is applied and the error carries the restored list.
//! Guests have no wishlist.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::{ClientError, WishlistBackend};
use crate::domain::aggregates::Wishlist;

#[derive(Debug, Error)]
pub enum WishlistError {
    #[error("Sign in to use the wishlist")]
    NotSignedIn,

    #[error("Could not update the wishlist: {source}")]
    Persist {
        #[source]
        source: ClientError,
        /// Local state after the rollback
        restored: Vec<Uuid>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle { Added, Removed }

#[derive(Default)]
pub struct WishlistReconciler {
    backend: Option<Arc<dyn WishlistBackend>>,
    items: Wishlist,
}

impl WishlistReconciler {
    pub fn new() -> Self { Self::default() }

    pub fn is_signed_in(&self) -> bool { self.backend.is_some() }
    pub fn ids(&self) -> &[Uuid] { self.items.ids() }
    pub fn contains(&self, product_id: Uuid) -> bool { self.items.contains(product_id) }

    /// Replace local state with the server wishlist.
    pub async fn sign_in(&mut self, backend: Arc<dyn WishlistBackend>) -> Result<(), ClientError> {
        let ids = backend.fetch_wishlist().await?;
        self.items = Wishlist::from_ids(ids);
        self.backend = Some(backend);
        Ok(())
    }

    pub fn sign_out(&mut self) {
        self.backend = None;
        self.items = Wishlist::new();
    }

    pub async fn add(&mut self, product_id: Uuid) -> Result<(), WishlistError> {
        let backend = self.backend.clone().ok_or(WishlistError::NotSignedIn)?;
        if !self.items.add(product_id) {
            return Ok(());
        }
        if let Err(source) = backend.add_to_wishlist(product_id).await {
            self.items.remove(product_id);
            return Err(self.rolled_back(source));
        }
        Ok(())
    }

    pub async fn remove(&mut self, product_id: Uuid) -> Result<(), WishlistError> {
        let backend = self.backend.clone().ok_or(WishlistError::NotSignedIn)?;
        let snapshot = self.items.clone();
        if !self.items.remove(product_id) {
            return Ok(());
        }
        if let Err(source) = backend.remove_from_wishlist(product_id).await {
            self.items = snapshot;
            return Err(self.rolled_back(source));
        }
        Ok(())
    }

    pub async fn toggle(&mut self, product_id: Uuid) -> Result<Toggle, WishlistError> {
        if self.contains(product_id) {
            self.remove(product_id).await.map(|()| Toggle::Removed)
        } else {
            self.add(product_id).await.map(|()| Toggle::Added)
        }
    }

    fn rolled_back(&self, source: ClientError) -> WishlistError {
        warn!(error = %source, "Wishlist change rolled back");
        WishlistError::Persist { source, restored: self.items.ids().to_vec() }
    }
}
