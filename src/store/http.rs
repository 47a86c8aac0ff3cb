//! REST implementation of the inventory and cart collaborators.
//!
//! ## Routes
//!
//! - `GET /api/cart` — list cart entries.
//! - `GET /api/items?ids=1,2,3` — list inventory records for the given ids.
//! - `GET /api/items` — list the whole catalog.
//! - `PUT /api/cart/:item_id` — set an entry's quantity. Body `{ "quantity": n }`.
//! - `DELETE /api/cart/:item_id` — remove an entry.
//! - `POST /api/cart` — add an item from the catalog. Body `{ "itemId": id, "quantity": n }`.
//!
//! Every request carries `Authorization: Bearer <token>` from the [`Session`].
//! Item ids are percent-encoded as a single path segment. An id containing a
//! comma cannot be listed in `ids=` and is rejected before any request.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, IntoUrl, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{CartStore, InventorySource, StoreError};
use crate::config::ApiConfig;
use crate::model::{CartEntry, InventoryRecord, ItemId};
use crate::session::Session;

const CART_PATH: &str = "/api/cart";
const ITEMS_PATH: &str = "/api/items";

#[derive(Serialize)]
struct QuantityBody {
    quantity: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartBody<'a> {
    item_id: &'a ItemId,
    quantity: i64,
}

/// Storefront REST client.
///
/// Clone-friendly: clones share the underlying connection pool, so one value
/// can serve as both the inventory source and the cart store.
#[derive(Debug, Clone)]
pub struct HttpStorefront {
    client: Client,
    config: ApiConfig,
    session: Session,
}

impl HttpStorefront {
    /// Build a client with the configured timeouts.
    pub fn new(config: ApiConfig, session: Session) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, config, session))
    }

    /// Use an existing `reqwest::Client`.
    pub fn with_client(client: Client, config: ApiConfig, session: Session) -> Self {
        Self {
            client,
            config,
            session,
        }
    }

    /// A copy of this client acting under another session.
    pub fn with_session(&self, session: Session) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            session,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn api_url(&self, path: &str) -> String {
        self.config.url(path)
    }

    /// `/api/cart/<item_id>` with the id encoded as one segment.
    fn entry_url(&self, item_id: &ItemId) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.api_url(CART_PATH))
            .map_err(|e| StoreError::Transport(format!("invalid api url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("api url cannot take a path".into()))?
            .push(&item_id.to_string());
        Ok(url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder.send().await.map_err(transport_error)?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        let response = self.send(builder).await?;
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl InventorySource for HttpStorefront {
    async fn items(&self, ids: &[ItemId]) -> Result<Vec<InventoryRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let csv = ids_param(ids)?;
        tracing::debug!(ids = %csv, "fetching inventory records");
        let builder = self
            .request(Method::GET, self.api_url(ITEMS_PATH))
            .query(&[("ids", csv)]);
        self.get_json::<Vec<InventoryRecord>>(builder).await
    }

    async fn all_items(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        tracing::debug!("fetching catalog");
        self.get_json::<Vec<InventoryRecord>>(self.request(Method::GET, self.api_url(ITEMS_PATH)))
            .await
    }
}

#[async_trait]
impl CartStore for HttpStorefront {
    async fn entries(&self) -> Result<Vec<CartEntry>, StoreError> {
        tracing::debug!("fetching cart entries");
        self.get_json::<Vec<CartEntry>>(self.request(Method::GET, self.api_url(CART_PATH)))
            .await
    }

    async fn upsert(&self, item_id: &ItemId, quantity: i64) -> Result<(), StoreError> {
        tracing::debug!(item_id = %item_id, quantity, "upserting cart entry");
        let builder = self
            .request(Method::PUT, self.entry_url(item_id)?)
            .header(CONTENT_TYPE, "application/json")
            .json(&QuantityBody { quantity });
        self.send(builder).await.map(|_| ())
    }

    async fn delete(&self, item_id: &ItemId) -> Result<(), StoreError> {
        tracing::debug!(item_id = %item_id, "deleting cart entry");
        let url = self.entry_url(item_id)?;
        self.send(self.request(Method::DELETE, url)).await.map(|_| ())
    }

    async fn add(&self, item_id: &ItemId, quantity: i64) -> Result<(), StoreError> {
        tracing::debug!(item_id = %item_id, quantity, "adding item to cart");
        let builder = self
            .request(Method::POST, self.api_url(CART_PATH))
            .header(CONTENT_TYPE, "application/json")
            .json(&AddToCartBody { item_id, quantity });
        self.send(builder).await.map(|_| ())
    }
}

/// Comma-separated ids for the `ids=` filter.
fn ids_param(ids: &[ItemId]) -> Result<String, StoreError> {
    if let Some(id) = ids.iter().find(|id| id.to_string().contains(',')) {
        return Err(StoreError::InvalidItemId(id.clone()));
    }
    Ok(ids
        .iter()
        .map(ItemId::to_string)
        .collect::<Vec<_>>()
        .join(","))
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Transport(err.to_string())
    }
}

/// Pass 2xx responses through; classify everything else.
///
/// A `401`, or any failure whose body says `invalid token`, is an auth
/// rejection. Other failures keep the status and the body's `message`.
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    tracing::warn!(status = status.as_u16(), message = %message, "storefront request failed");

    Err(classify_failure(status, message))
}

fn classify_failure(status: StatusCode, message: String) -> StoreError {
    if status == StatusCode::UNAUTHORIZED || message.eq_ignore_ascii_case("invalid token") {
        let reason = if message.is_empty() {
            status.to_string()
        } else {
            message
        };
        return StoreError::Unauthorized(reason);
    }
    StoreError::Status {
        status: status.as_u16(),
        message,
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_owned))
        .unwrap_or_default()
}
