//! End-to-end tests against the router backed by the in-memory store.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use opensase_storefront::auth::hash_password;
use opensase_storefront::client::{CartReconciler, DeviceStorage, MemoryStorage, StorefrontClient, Toggle, WishlistReconciler};
use opensase_storefront::domain::value_objects::Email;
use opensase_storefront::publisher::EventPublisher;
use opensase_storefront::store::MemoryStore;
use opensase_storefront::{app, AppState, Config};

const ADMIN_EMAIL: &str = "admin@shop.test";
const ADMIN_PASSWORD: &str = "admin-password";

fn config() -> Config {
    Config {
        database_url: None,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        jwt_secret: SecretString::from("0123456789abcdef0123456789abcdef".to_string()),
        jwt_expiration_minutes: 60,
        admin_email: Email::parse(ADMIN_EMAIL).unwrap(),
        admin_password_hash: SecretString::from(hash_password(ADMIN_PASSWORD).unwrap()),
        nats_url: None,
        price_tolerance: Decimal::new(1, 2),
    }
}

fn router() -> Router {
    app(AppState::new(config(), Arc::new(MemoryStore::new()), EventPublisher::disabled()))
}

async fn send(router: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn login(router: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(router, Method::POST, "/api/auth/login", None, Some(json!({ "email": email, "password": password }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn admin_token(router: &Router) -> String { login(router, ADMIN_EMAIL, ADMIN_PASSWORD).await }

async fn signup(router: &Router, email: &str) -> String {
    let body = json!({
        "name": "Dana",
        "email": email,
        "password": "secret-pass",
        "address": { "country": "NG", "city": "Lagos", "street": "1 Marina" }
    });
    let (status, created) = send(router, Method::POST, "/api/signup", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["role"], "user");
    assert!(created.get("passwordHash").is_none());
    login(router, email, "secret-pass").await
}

async fn create_product(router: &Router, token: &str, body: Value) -> String {
    let (status, product) = send(router, Method::POST, "/api/products", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    product["id"].as_str().unwrap().to_string()
}

fn address() -> Value { json!({ "country": "NG", "city": "Lagos", "street": "1 Marina" }) }

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&router(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_created_product_is_searchable() {
    let router = router();
    let admin = admin_token(&router).await;
    let id = create_product(&router, &admin, json!({ "name": "Tee", "price": 20, "category": "clothing", "stock": 5 })).await;
    create_product(&router, &admin, json!({ "name": "Mug", "price": 8, "category": "kitchen", "stock": 2 })).await;

    let (status, page) = send(&router, Method::GET, "/api/products?q=Tee", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalCount"], 1);
    assert_eq!(page["items"][0]["id"], id.as_str());

    let (_, page) = send(&router, Method::GET, "/api/products?category=kitchen&maxPrice=10", None, None).await;
    assert_eq!(page["items"][0]["name"], "Mug");

    let (status, _) = send(&router, Method::GET, &format!("/api/products/{}", uuid::Uuid::nil()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_mutations_require_admin() {
    let router = router();
    let product = json!({ "name": "Tee", "price": 20, "category": "clothing" });
    let (status, _) = send(&router, Method::POST, "/api/products", None, Some(product.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = signup(&router, "dana@shop.test").await;
    let (status, body) = send(&router, Method::POST, "/api/products", Some(&user), Some(product)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(&router, Method::GET, "/api/admin/stats", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = admin_token(&router).await;
    let (status, stats) = send(&router, Method::GET, "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["users"], 2);
    assert_eq!(stats["products"], 0);

    for price in [json!(-1), json!(1e20), json!(1.999)] {
        let (status, body) = send(&router, Method::POST, "/api/products", Some(&admin), Some(json!({ "name": "Tee", "price": price, "category": "clothing" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {price}");
        assert!(body["error"].is_string());
    }
    let (_, stats) = send(&router, Method::GET, "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(stats["products"], 0);
}

#[tokio::test]
async fn test_malformed_ids_are_bad_requests() {
    let router = router();
    let admin = admin_token(&router).await;
    let (status, body) = send(&router, Method::GET, "/api/products/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = send(&router, Method::DELETE, "/api/products/42", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = send(&router, Method::GET, "/api/orders/not-a-uuid", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = send(&router, Method::PATCH, "/api/orders/xyz/status", Some(&admin), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn test_signup_and_login_failures() {
    let router = router();
    signup(&router, "dana@shop.test").await;

    let duplicate = json!({ "name": "Dana", "email": "Dana@Shop.test", "password": "secret-pass", "address": address() });
    let (status, body) = send(&router, Method::POST, "/api/signup", None, Some(duplicate)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");

    let reserved = json!({ "name": "Mallory", "email": ADMIN_EMAIL, "password": "secret-pass", "address": address() });
    let (status, _) = send(&router, Method::POST, "/api/signup", None, Some(reserved)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let no_city = json!({ "name": "Eve", "email": "eve@shop.test", "password": "secret-pass", "address": { "country": "NG", "street": "x" } });
    let (status, _) = send(&router, Method::POST, "/api/signup", None, Some(no_city)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::POST, "/api/auth/login", None, Some(json!({ "email": "dana@shop.test", "password": "wrong" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, Method::GET, "/api/auth/session", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_order_lifecycle() {
    let router = router();
    let admin = admin_token(&router).await;
    let user = signup(&router, "dana@shop.test").await;
    let id = create_product(
        &router,
        &admin,
        json!({ "name": "Hoodie", "price": 29.99, "category": "clothing", "stock": 5,
                "variants": [{ "color": "Black", "image": "/img/hoodie-black.png" }] }),
    )
    .await;

    let order = json!({
        "items": [{ "productId": id, "quantity": 2, "price": 29.99, "color": "Black" }],
        "shippingAddress": address(),
        "totalAmount": 59.98,
        "paymentMethod": "COD"
    });
    let (status, created) = send(&router, Method::POST, "/api/orders", Some(&user), Some(order)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["success"], true);
    let order_id = created["orderId"].as_str().unwrap().to_string();

    let (_, product) = send(&router, Method::GET, &format!("/api/products/{id}"), None, None).await;
    assert_eq!(product["stock"], 3);

    let (_, mine) = send(&router, Method::GET, "/api/orders/mine", Some(&user), None).await;
    assert_eq!(mine[0]["id"], order_id.as_str());
    assert_eq!(mine[0]["status"], "pending");
    assert_eq!(mine[0]["totalAmount"].as_f64(), Some(59.98));
    assert_eq!(mine[0]["items"][0]["image"], "/img/hoodie-black.png");

    let status_uri = format!("/api/orders/{order_id}/status");
    let step = |to: &'static str| json!({ "status": to });
    let (status, _) = send(&router, Method::PATCH, &status_uri, Some(&admin), Some(step("shipped"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&router, Method::PATCH, &status_uri, Some(&user), Some(step("processing"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for to in ["processing", "shipped", "delivered"] {
        let (status, body) = send(&router, Method::PATCH, &status_uri, Some(&admin), Some(step(to))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], to);
    }
    let (status, _) = send(&router, Method::PATCH, &status_uri, Some(&admin), Some(step("cancelled"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = send(&router, Method::GET, "/api/orders", Some(&admin), None).await;
    assert_eq!(listed["totalCount"], 1);
    assert_eq!(listed["items"][0]["nextStatuses"], json!([]));
}

#[tokio::test]
async fn test_cancellation_restores_stock() {
    let router = router();
    let admin = admin_token(&router).await;
    let user = signup(&router, "dana@shop.test").await;
    let kept = create_product(&router, &admin, json!({ "name": "Hoodie", "price": 29.99, "category": "clothing", "stock": 5 })).await;
    let dropped = create_product(&router, &admin, json!({ "name": "Cap", "price": 9, "category": "clothing", "stock": 4 })).await;
    let stock = |id: String| {
        let router = router.clone();
        async move { send(&router, Method::GET, &format!("/api/products/{id}"), None, None).await.1["stock"].clone() }
    };
    let place = |items: Value| json!({ "items": items, "shippingAddress": address() });
    let cancel = json!({ "status": "cancelled" });

    let (status, created) = send(&router, Method::POST, "/api/orders", Some(&user), Some(place(json!([{ "productId": kept, "quantity": 2 }])))).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(stock(kept.clone()).await, 3);
    let uri = format!("/api/orders/{}/status", created["orderId"].as_str().unwrap());
    let (status, body) = send(&router, Method::PATCH, &uri, Some(&admin), Some(cancel.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "cancelled");
    assert_eq!(stock(kept.clone()).await, 5);

    // A line whose product is gone is skipped; the rest is still released
    let items = json!([{ "productId": kept, "quantity": 1 }, { "productId": dropped, "quantity": 3 }]);
    let (status, created) = send(&router, Method::POST, "/api/orders", Some(&user), Some(place(items))).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(stock(kept.clone()).await, 4);
    let (status, _) = send(&router, Method::DELETE, &format!("/api/products/{dropped}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let uri = format!("/api/orders/{}/status", created["orderId"].as_str().unwrap());
    let (status, body) = send(&router, Method::PATCH, &uri, Some(&admin), Some(cancel)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(stock(kept).await, 5);
    let (status, _) = send(&router, Method::GET, &format!("/api/products/{dropped}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_rejects_bad_submissions() {
    let router = router();
    let admin = admin_token(&router).await;
    let id = create_product(&router, &admin, json!({ "name": "Tee", "price": 20, "category": "clothing", "stock": 1 })).await;

    let submit = |items: Value, shipping: Value, total: f64| json!({ "items": items, "shippingAddress": shipping, "totalAmount": total });
    let cases = [
        submit(json!([]), address(), 0.0),
        submit(json!([{ "productId": id, "quantity": 1, "price": 20 }]), json!({ "country": "NG" }), 20.0),
        submit(json!([{ "productId": id, "quantity": 1, "price": 1 }]), address(), 1.0),
        submit(json!([{ "productId": id, "quantity": 1, "price": 20 }]), address(), 5.0),
        submit(json!([{ "productId": id, "quantity": 2, "price": 20 }]), address(), 40.0),
    ];
    for case in cases {
        let (status, body) = send(&router, Method::POST, "/api/orders", None, Some(case)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(body["error"].is_string());
    }

    let (_, stats) = send(&router, Method::GET, "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(stats["orders"], 0);
    let (_, product) = send(&router, Method::GET, &format!("/api/products/{id}"), None, None).await;
    assert_eq!(product["stock"], 1);
}

#[tokio::test]
async fn test_deleted_product_keeps_order_snapshot() {
    let router = router();
    let admin = admin_token(&router).await;
    let owner = signup(&router, "dana@shop.test").await;
    let other = signup(&router, "eve@shop.test").await;
    let id = create_product(
        &router,
        &admin,
        json!({ "name": "Tee", "price": 20, "category": "clothing", "stock": 3,
                "variants": [{ "color": "Red", "image": "/img/tee-red.png" }] }),
    )
    .await;
    let order = json!({ "items": [{ "productId": id, "quantity": 1, "color": "Red" }], "shippingAddress": address() });
    let (_, created) = send(&router, Method::POST, "/api/orders", Some(&owner), Some(order)).await;
    let order_uri = format!("/api/orders/{}", created["orderId"].as_str().unwrap());

    let (status, _) = send(&router, Method::DELETE, &format!("/api/products/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, order) = send(&router, Method::GET, &order_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let line = &order["items"][0];
    assert_eq!(line["name"], "Tee");
    assert_eq!(line["color"], "Red");
    assert_eq!(line["image"], "/img/tee-red.png");
    assert_eq!(line["productAvailable"], false);

    let (status, _) = send(&router, Method::GET, &order_uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&router, Method::GET, &order_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_server_cart_merge_and_wishlist() {
    let router = router();
    let admin = admin_token(&router).await;
    let user = signup(&router, "dana@shop.test").await;
    let x = create_product(&router, &admin, json!({ "name": "Tee", "price": 20, "category": "clothing", "stock": 9 })).await;

    let (_, guest) = send(&router, Method::GET, "/api/cart", None, None).await;
    assert_eq!(guest, json!({ "items": [] }));

    let line = |quantity: u32| json!({ "items": [{ "productId": x, "quantity": quantity, "color": "Black" }] });
    let (status, _) = send(&router, Method::POST, "/api/cart", Some(&user), Some(line(1))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, merged) = send(&router, Method::POST, "/api/cart/merge", Some(&user), Some(line(2))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(merged["items"].as_array().unwrap().len(), 1);
    assert_eq!(merged["items"][0]["quantity"], 3);

    let (status, body) = send(&router, Method::POST, "/api/wishlist", Some(&user), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Product ID is required");

    let (_, added) = send(&router, Method::POST, "/api/wishlist", Some(&user), Some(json!({ "productId": x }))).await;
    assert_eq!(added["productIds"], json!([x]));
    let (_, listed) = send(&router, Method::GET, "/api/wishlist", Some(&user), None).await;
    assert_eq!(listed["products"][0]["name"], "Tee");
    let (_, removed) = send(&router, Method::DELETE, "/api/wishlist", Some(&user), Some(json!({ "productId": x }))).await;
    assert_eq!(removed["productIds"], json!([]));

    let (status, _) = send(&router, Method::GET, "/api/wishlist", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleted_product_leaves_cart_and_wishlist_views() {
    let router = router();
    let admin = admin_token(&router).await;
    let user = signup(&router, "dana@shop.test").await;
    let x = create_product(&router, &admin, json!({ "name": "Tee", "price": 20, "category": "clothing", "stock": 9 })).await;
    let y = create_product(&router, &admin, json!({ "name": "Mug", "price": 8, "category": "kitchen", "stock": 9 })).await;

    let cart = json!({ "items": [
        { "productId": x, "quantity": 1, "color": "Black" },
        { "productId": y, "quantity": 2 }
    ] });
    let (status, _) = send(&router, Method::POST, "/api/cart", Some(&user), Some(cart)).await;
    assert_eq!(status, StatusCode::OK);
    for id in [&x, &y] {
        let (status, _) = send(&router, Method::POST, "/api/wishlist", Some(&user), Some(json!({ "productId": id }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(&router, Method::DELETE, &format!("/api/products/{y}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, cart) = send(&router, Method::GET, "/api/cart", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK, "{cart}");
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["productId"], x.as_str());
    assert_eq!(cart["items"][0]["quantity"], 1);

    let guest = json!({ "items": [{ "productId": y, "quantity": 1 }, { "productId": x, "quantity": 1, "color": "Black" }] });
    let (status, merged) = send(&router, Method::POST, "/api/cart/merge", Some(&user), Some(guest)).await;
    assert_eq!(status, StatusCode::OK, "{merged}");
    assert_eq!(merged["items"].as_array().unwrap().len(), 1);
    assert_eq!(merged["items"][0]["productId"], x.as_str());
    assert_eq!(merged["items"][0]["quantity"], 2);
    let (_, reloaded) = send(&router, Method::GET, "/api/cart", Some(&user), None).await;
    assert_eq!(reloaded, merged);

    let (status, wishlist) = send(&router, Method::GET, "/api/wishlist", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK, "{wishlist}");
    assert_eq!(wishlist["productIds"], json!([x, y]));
    let products = wishlist["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], x.as_str());
}

#[tokio::test]
async fn test_profile_update() {
    let router = router();
    let user = signup(&router, "dana@shop.test").await;
    let update = json!({ "name": "Dana O.", "address": { "country": "GH", "city": "Accra", "street": "2 Ring Rd" } });
    let (status, body) = send(&router, Method::PUT, "/api/users/me", Some(&user), Some(update)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["address"]["city"], "Accra");

    let blank = json!({ "name": "Dana", "address": { "country": "GH", "city": "", "street": "x" } });
    let (status, _) = send(&router, Method::PUT, "/api/users/me", Some(&user), Some(blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, me) = send(&router, Method::GET, "/api/users/me", Some(&user), None).await;
    assert_eq!(me["name"], "Dana O.");
}

#[tokio::test]
async fn test_client_stores_against_live_server() {
    let router = router();
    let admin = admin_token(&router).await;
    signup(&router, "dana@shop.test").await;
    let x = create_product(&router, &admin, json!({ "name": "Tee", "price": 20, "category": "clothing", "stock": 9 })).await;
    let x: uuid::Uuid = x.parse().unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let storage: Arc<dyn DeviceStorage> = Arc::new(MemoryStorage::new());
    let mut cart = CartReconciler::load_guest(storage.clone()).unwrap();
    cart.add_item(x, 1, Some("Black".into()), None).await.unwrap();
    cart.add_item(x, 2, Some("Black".into()), None).await.unwrap();
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.count(), 3);

    let mut client = StorefrontClient::new(format!("http://{addr}"));
    let session = client.login("dana@shop.test", "secret-pass").await.unwrap();
    assert_eq!(session.email, "dana@shop.test");

    let backend = Arc::new(client);
    cart.sign_in(backend.clone()).await.unwrap();
    assert_eq!(cart.count(), 3);
    cart.add_item(x, 1, Some("White".into()), None).await.unwrap();

    let mut reloaded = CartReconciler::load_guest(storage).unwrap();
    assert!(reloaded.items().is_empty());
    reloaded.sign_in(backend.clone()).await.unwrap();
    assert_eq!(reloaded.count(), 4);
    assert_eq!(reloaded.items().len(), 2);

    let mut wishlist = WishlistReconciler::new();
    wishlist.sign_in(backend.clone()).await.unwrap();
    assert_eq!(wishlist.toggle(x).await.unwrap(), Toggle::Added);
    let mut fresh = WishlistReconciler::new();
    fresh.sign_in(backend.clone()).await.unwrap();
    assert_eq!(fresh.ids(), &[x]);
    assert_eq!(wishlist.toggle(x).await.unwrap(), Toggle::Removed);
    assert!(wishlist.ids().is_empty());
}
