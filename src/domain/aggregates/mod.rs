//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod user;
pub mod wishlist;

pub use product::{Product, ProductDraft, ProductError, Variant, PLACEHOLDER_IMAGE};
pub use order::{LineItem, Order, OrderError, OrderStatus};
pub use cart::{Cart, CartError, CartLine};
pub use user::User;
pub use wishlist::Wishlist;
