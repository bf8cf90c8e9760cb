//! OpenSASE Storefront
//!
//! Self-hosted storefront: catalog, cart, checkout and order handling.
//!
//! ## Features
//! - Product catalog with search, filtering and pagination
//! - Guest and signed-in carts with merge on sign-in
//! - Checkout with server-side price validation and stock reservation
//! - Order status lifecycle driven by administrators
//! - Wishlists and color-variant detection from product images

pub mod auth;
pub mod checkout;
pub mod client;
pub mod colors;
pub mod config;
pub mod domain;
pub mod error;
pub mod publisher;
pub mod routes;
pub mod state;
pub mod store;
pub mod variants;

pub use config::Config;
pub use error::{AppError, Result};
pub use routes::router as app;
pub use state::AppState;
