//! Wishlist: an ordered set of product references

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist(Vec<Uuid>);

impl Wishlist {
    pub fn new() -> Self { Self::default() }

    pub fn from_ids(ids: impl IntoIterator<Item = Uuid>) -> Self {
        let mut list = Self::new();
        for id in ids { list.add(id); }
        list
    }

    pub fn ids(&self) -> &[Uuid] { &self.0 }
    pub fn contains(&self, id: Uuid) -> bool { self.0.contains(&id) }

    /// Returns false when the product was already present.
    pub fn add(&mut self, id: Uuid) -> bool {
        if self.contains(id) { return false; }
        self.0.push(id);
        true
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.0.len();
        self.0.retain(|p| *p != id);
        self.0.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_round_trip() {
        let id = Uuid::new_v4();
        let mut list = Wishlist::new();
        assert!(list.add(id));
        assert!(!list.add(id));
        assert!(list.contains(id));
        assert!(list.remove(id));
        assert!(!list.remove(id));
        assert!(list.ids().is_empty());
    }

    #[test]
    fn test_no_duplicates() {
        let id = Uuid::new_v4();
        let list = Wishlist::from_ids([id, id, Uuid::new_v4()]);
        assert_eq!(list.ids().len(), 2);
        assert_eq!(list.ids()[0], id);
    }
}
