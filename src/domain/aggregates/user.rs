//! User Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Wishlist;
use crate::domain::events::{DomainEvent, UserEvent};
use crate::domain::value_objects::{Email, Role, ShippingAddress};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: Uuid,
    name: String,
    email: Email,
    #[serde(skip_serializing)]
    password_hash: String,
    role: Role,
    image: String,
    address: ShippingAddress,
    wishlist: Wishlist,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl User {
    /// A regular account created at signup. The role is always `user`.
    pub fn register(name: impl Into<String>, email: Email, password_hash: String, address: ShippingAddress) -> Self {
        let mut user = Self::build(name.into(), email, password_hash, Role::User, address);
        user.raise_event(DomainEvent::User(UserEvent::Registered { user_id: user.id }));
        user
    }

    /// Record for the reserved admin account, created on its first login.
    pub fn provision_admin(email: Email, password_hash: String) -> Self {
        let address = ShippingAddress::new("Admin", "HQ", "Main");
        let mut user = Self::build("Store Admin".into(), email, password_hash, Role::Admin, address);
        user.raise_event(DomainEvent::User(UserEvent::AdminProvisioned { user_id: user.id }));
        user
    }

    fn build(name: String, email: Email, password_hash: String, role: Role, address: ShippingAddress) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), name, email, password_hash, role, image: String::new(), address,
            wishlist: Wishlist::new(), created_at: now, updated_at: now, events: vec![],
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid, name: String, email: Email, password_hash: String, role: Role, image: String,
        address: ShippingAddress, wishlist: Wishlist, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, name, email, password_hash, role, image, address, wishlist, created_at, updated_at, events: vec![] }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn email(&self) -> &Email { &self.email }
    pub fn password_hash(&self) -> &str { &self.password_hash }
    pub fn role(&self) -> Role { self.role }
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
    pub fn image(&self) -> &str { &self.image }
    pub fn address(&self) -> &ShippingAddress { &self.address }
    pub fn wishlist(&self) -> &Wishlist { &self.wishlist }
    pub fn wishlist_mut(&mut self) -> &mut Wishlist { self.touch(); &mut self.wishlist }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn update_profile(&mut self, name: impl Into<String>, address: ShippingAddress) {
        self.name = name.into();
        self.address = address;
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}
