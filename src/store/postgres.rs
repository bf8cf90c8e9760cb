//! `PostgreSQL` store. Nested structures (variants, line items, addresses,
//! cart lines) live in JSONB columns so each record reads back as one
//! document.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{CartRepository, OrderRepository, Page, ProductQuery, ProductRepository, ProductSort, StoreError, StoreResult, UserRepository};
use crate::domain::aggregates::{Cart, CartLine, LineItem, Order, OrderStatus, Product, User, Variant, Wishlist};
use crate::domain::value_objects::{Email, Price, Role, ShippingAddress};

/// Create a connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, stock, variants, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, password_hash, role, image, address, wishlist, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, user_id, items, total_amount, shipping_address, payment_method, status, created_at, updated_at";

#[derive(FromRow)]
struct ProductRow {
    id: Uuid, name: String, description: String, price: Decimal, category: String, stock: i32,
    variants: Json<Vec<Variant>>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;
    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(r.price).map_err(|e| StoreError::DataCorruption(format!("product {}: {e}", r.id)))?;
        let stock = u32::try_from(r.stock).map_err(|_| StoreError::DataCorruption(format!("product {}: negative stock", r.id)))?;
        Ok(Product::from_parts(r.id, r.name, r.description, price, r.category, stock, r.variants.0, r.created_at, r.updated_at))
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid, name: String, email: String, password_hash: String, role: String, image: String,
    address: Json<ShippingAddress>, wishlist: Vec<Uuid>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;
    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;
        let role = Role::parse(&r.role).ok_or_else(|| StoreError::DataCorruption(format!("unknown role {}", r.role)))?;
        Ok(User::from_parts(r.id, r.name, email, r.password_hash, role, r.image, r.address.0, Wishlist::from_ids(r.wishlist), r.created_at, r.updated_at))
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: Uuid, user_id: Option<Uuid>, items: Json<Vec<LineItem>>, total_amount: Decimal,
    shipping_address: Json<ShippingAddress>, payment_method: String, status: String,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;
    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = r.status.parse().map_err(|e| StoreError::DataCorruption(format!("order {}: {e}", r.id)))?;
        Ok(Order::from_parts(r.id, r.user_id, r.items.0, r.total_amount, r.shipping_address.0, r.payment_method, status, r.created_at, r.updated_at))
    }
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn to_i32(value: u32) -> i32 { i32::try_from(value).unwrap_or(i32::MAX) }

fn to_u64(value: i64) -> u64 { u64::try_from(value).unwrap_or(0) }

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn map_unique(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(format!("{what} already exists"));
        }
    }
    StoreError::Database(e)
}

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    if let Some(term) = query.search_term() {
        qb.push(" AND name ILIKE ").push_bind(format!("%{}%", escape_like(term)));
    }
    if let Some(category) = query.category_filter() {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    if let Some(min) = query.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn insert_product(&self, p: &Product) -> StoreResult<()> {
        sqlx::query("INSERT INTO products (id, name, description, price, category, stock, variants, colors, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)")
            .bind(p.id()).bind(p.name()).bind(p.description()).bind(p.price().amount()).bind(p.category())
            .bind(to_i32(p.stock())).bind(Json(p.variants())).bind(p.colors()).bind(p.created_at()).bind(p.updated_at())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id).fetch_optional(&self.pool).await?
            .map(Product::try_from).transpose()
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        if ids.is_empty() { return Ok(vec![]); }
        let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"))
            .bind(ids).fetch_all(&self.pool).await?;
        collect(rows)
    }

    async fn update_product(&self, p: &Product) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, category = $5, stock = $6, variants = $7, colors = $8, updated_at = $9 WHERE id = $1")
            .bind(p.id()).bind(p.name()).bind(p.description()).bind(p.price().amount()).bind(p.category())
            .bind(to_i32(p.stock())).bind(Json(p.variants())).bind(p.colors()).bind(p.updated_at())
            .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_products(&self, query: &ProductQuery) -> StoreResult<Page<Product>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
        push_product_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
        push_product_filters(&mut select, query);
        select.push(match query.sort {
            ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProductSort::PriceAsc => " ORDER BY price ASC, created_at DESC, id DESC",
            ProductSort::PriceDesc => " ORDER BY price DESC, created_at DESC, id DESC",
        });
        select.push(" LIMIT ").push_bind(i64::from(query.page_size()));
        select.push(" OFFSET ").push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
        let rows = select.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        Ok(Page::new(collect(rows)?, to_u64(total), query.page(), query.page_size()))
    }

    async fn count_products(&self) -> StoreResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(&self.pool).await?;
        Ok(to_u64(total))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, u: &User) -> StoreResult<()> {
        sqlx::query("INSERT INTO users (id, name, email, password_hash, role, image, address, wishlist, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)")
            .bind(u.id()).bind(u.name()).bind(u.email().as_str()).bind(u.password_hash()).bind(u.role().as_str())
            .bind(u.image()).bind(Json(u.address())).bind(u.wishlist().ids()).bind(u.created_at()).bind(u.updated_at())
            .execute(&self.pool).await
            .map_err(|e| map_unique(e, "email"))?;
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id).fetch_optional(&self.pool).await?
            .map(User::try_from).transpose()
    }

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str()).fetch_optional(&self.pool).await?
            .map(User::try_from).transpose()
    }

    async fn update_profile(&self, u: &User) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET name = $2, address = $3, updated_at = NOW() WHERE id = $1")
            .bind(u.id()).bind(u.name()).bind(Json(u.address()))
            .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"))
            .fetch_all(&self.pool).await?;
        collect(rows)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&self.pool).await?;
        Ok(to_u64(total))
    }

    async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Vec<Uuid>>> {
        let list = sqlx::query_scalar(
            "UPDATE users SET wishlist = CASE WHEN $2 = ANY(wishlist) THEN wishlist ELSE array_append(wishlist, $2) END, updated_at = NOW() WHERE id = $1 RETURNING wishlist",
        )
        .bind(user_id).bind(product_id)
        .fetch_optional(&self.pool).await?;
        Ok(list)
    }

    async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Vec<Uuid>>> {
        let list = sqlx::query_scalar("UPDATE users SET wishlist = array_remove(wishlist, $2), updated_at = NOW() WHERE id = $1 RETURNING wishlist")
            .bind(user_id).bind(product_id)
            .fetch_optional(&self.pool).await?;
        Ok(list)
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn cart_for(&self, user_id: Uuid) -> StoreResult<Cart> {
        let items: Option<Json<Vec<CartLine>>> = sqlx::query_scalar("SELECT items FROM carts WHERE user_id = $1")
            .bind(user_id).fetch_optional(&self.pool).await?;
        match items {
            Some(Json(lines)) => Cart::from_lines(lines).map_err(|e| StoreError::DataCorruption(format!("cart of {user_id}: {e}"))),
            None => Ok(Cart::new()),
        }
    }

    async fn replace_cart(&self, user_id: Uuid, cart: &Cart) -> StoreResult<()> {
        sqlx::query("INSERT INTO carts (user_id, items, created_at, updated_at) VALUES ($1, $2, NOW(), NOW()) ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()")
            .bind(user_id).bind(Json(cart.items()))
            .execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn place_order(&self, o: &Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        // BTreeMap order keeps row locks in a consistent sequence
        for (product_id, qty) in o.reservations() {
            let result = sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1 AND stock >= $2")
                .bind(product_id).bind(to_i32(qty))
                .execute(&mut *tx).await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::InsufficientStock(product_id));
            }
        }
        sqlx::query("INSERT INTO orders (id, user_id, items, total_amount, shipping_address, payment_method, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)")
            .bind(o.id()).bind(o.user_id()).bind(Json(o.items())).bind(o.total_amount()).bind(Json(o.shipping_address()))
            .bind(o.payment_method()).bind(o.status().as_str()).bind(o.created_at()).bind(o.updated_at())
            .execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id).fetch_optional(&self.pool).await?
            .map(Order::try_from).transpose()
    }

    async fn list_orders(&self, page: u32, page_size: u32) -> StoreResult<Page<Order>> {
        let (page, page_size) = (page.max(1), page_size.max(1));
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"))
            .bind(i64::from(page_size)).bind(i64::from(page - 1) * i64::from(page_size))
            .fetch_all(&self.pool).await?;
        Ok(Page::new(collect(rows)?, to_u64(total), page, page_size))
    }

    async fn orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"))
            .bind(user_id).fetch_all(&self.pool).await?;
        collect(rows)
    }

    async fn save_transition(&self, o: &Order, from: OrderStatus) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE orders SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2")
            .bind(o.id()).bind(from.as_str()).bind(o.status().as_str()).bind(o.updated_at())
            .execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        if o.status() == OrderStatus::Cancelled {
            for (product_id, qty) in o.reservations() {
                sqlx::query("UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1")
                    .bind(product_id).bind(to_i32(qty))
                    .execute(&mut *tx).await?;
            }
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn count_orders(&self) -> StoreResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        Ok(to_u64(total))
    }
}
