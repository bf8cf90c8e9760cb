//! HTTP backend talking to the storefront API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{CartBackend, ClientError, WishlistBackend};
use crate::auth::{LoginResponse, Session};
use crate::domain::aggregates::Cart;

#[derive(Clone)]
pub struct StorefrontClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WishlistIds {
    product_ids: Vec<Uuid>,
}

impl StorefrontClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: Client::new(), base_url: base_url.into().trim_end_matches('/').to_string(), token: None }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_signed_in(&self) -> bool { self.token.is_some() }

    /// Sign in and keep the session token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let login: LoginResponse = parse(response).await?;
        self.token = Some(login.token);
        Ok(login.user)
    }

    pub fn sign_out(&mut self) { self.token = None; }

    fn url(&self, path: &str) -> String { format!("{}{path}", self.base_url) }

    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotSignedIn)?;
        Ok(request.bearer_auth(token))
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = check(response).await?;
    Ok(response.json().await?)
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .map_or_else(|_| status.canonical_reason().unwrap_or("error").to_string(), |b| b.error);
    Err(ClientError::Status { status: status.as_u16(), message })
}

#[async_trait]
impl CartBackend for StorefrontClient {
    async fn fetch_cart(&self) -> Result<Cart, ClientError> {
        let response = self.authed(self.http.get(self.url("/api/cart")))?.send().await?;
        parse(response).await
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), ClientError> {
        let response = self.authed(self.http.post(self.url("/api/cart")))?.json(cart).send().await?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl WishlistBackend for StorefrontClient {
    async fn fetch_wishlist(&self) -> Result<Vec<Uuid>, ClientError> {
        let response = self.authed(self.http.get(self.url("/api/wishlist")))?.send().await?;
        Ok(parse::<WishlistIds>(response).await?.product_ids)
    }

    async fn add_to_wishlist(&self, product_id: Uuid) -> Result<(), ClientError> {
        let body = json!({ "productId": product_id });
        let response = self.authed(self.http.post(self.url("/api/wishlist")))?.json(&body).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn remove_from_wishlist(&self, product_id: Uuid) -> Result<(), ClientError> {
        let body = json!({ "productId": product_id });
        let response = self.authed(self.http.delete(self.url("/api/wishlist")))?.json(&body).send().await?;
        check(response).await?;
        Ok(())
    }
}
