//! Test double: a storefront REST API served by axum on an ephemeral port.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use storefront_cart::{ApiConfig, HttpStorefront, ItemId, Session};

pub const TOKEN: &str = "test-token";

#[derive(Default)]
pub struct MockState {
    /// `(id, name, price, stock)`
    pub items: Vec<(ItemId, &'static str, f64, u32)>,
    /// `(item_id, quantity)` in insertion order.
    pub cart: Vec<(ItemId, i64)>,
    pub auth_headers: Vec<Option<String>>,
    pub item_queries: Vec<Option<String>>,
    pub fail_put: HashSet<ItemId>,
    pub fail_delete: HashSet<ItemId>,
    pub token_invalid: bool,
    pub delay: Option<Duration>,
    pub added: Vec<Value>,
    pub puts: Vec<(ItemId, Value)>,
}

#[derive(Clone, Default)]
pub struct MockApi {
    pub state: Arc<Mutex<MockState>>,
}

impl MockApi {
    pub fn with_items(items: Vec<(u64, &'static str, f64, u32)>) -> Self {
        Self::with_catalog(
            items
                .into_iter()
                .map(|(id, name, price, stock)| (ItemId::from(id), name, price, stock))
                .collect(),
        )
    }

    pub fn with_catalog(items: Vec<(ItemId, &'static str, f64, u32)>) -> Self {
        let api = MockApi::default();
        api.state.lock().unwrap().items = items;
        api
    }

    pub fn put_entry(&self, item_id: u64, quantity: i64) {
        self.put_entry_id(ItemId::from(item_id), quantity);
    }

    pub fn put_entry_id(&self, item_id: ItemId, quantity: i64) {
        set_entry(&mut self.state.lock().unwrap().cart, item_id, quantity);
    }

    pub fn quantity_of(&self, item_id: u64) -> Option<i64> {
        self.quantity_of_id(&ItemId::from(item_id))
    }

    pub fn quantity_of_id(&self, item_id: &ItemId) -> Option<i64> {
        self.state
            .lock()
            .unwrap()
            .cart
            .iter()
            .find(|(id, _)| id == item_id)
            .map(|(_, q)| *q)
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    /// Bind to port 0 and return a client pointed at the server.
    pub async fn start(&self) -> HttpStorefront {
        self.start_with(Session::with_token(TOKEN), Duration::from_secs(5))
            .await
    }

    pub async fn start_with(&self, session: Session, timeout: Duration) -> HttpStorefront {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ApiConfig::new(format!("http://{addr}")).with_timeout(timeout);
        HttpStorefront::new(config, session).unwrap()
    }

    async fn gate(&self, headers: &HeaderMap) -> Option<Response> {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        state.auth_headers.push(auth.clone());

        let expected = format!("Bearer {TOKEN}");
        if auth.as_deref() != Some(expected.as_str()) {
            return Some(
                (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })))
                    .into_response(),
            );
        }
        if state.token_invalid {
            return Some(
                (StatusCode::FORBIDDEN, Json(json!({ "message": "Invalid token" })))
                    .into_response(),
            );
        }
        None
    }
}

/// Path and query ids arrive as text; digits are numeric ids.
fn parse_id(raw: &str) -> ItemId {
    raw.parse::<u64>()
        .map(ItemId::from)
        .unwrap_or_else(|_| ItemId::from(raw))
}

fn set_entry(cart: &mut Vec<(ItemId, i64)>, item_id: ItemId, quantity: i64) {
    match cart.iter_mut().find(|(id, _)| *id == item_id) {
        Some(entry) => entry.1 = quantity,
        None => cart.push((item_id, quantity)),
    }
}

fn router(api: MockApi) -> Router {
    Router::new()
        .route("/api/cart", get(list_cart).post(add_to_cart))
        .route("/api/cart/:item_id", put(upsert_entry).delete(delete_entry))
        .route("/api/items", get(list_items))
        .with_state(api)
}

async fn list_cart(State(api): State<MockApi>, headers: HeaderMap) -> Response {
    if let Some(rejection) = api.gate(&headers).await {
        return rejection;
    }
    let state = api.state.lock().unwrap();
    let body: Vec<Value> = state
        .cart
        .iter()
        .map(|(id, q)| json!({ "item_id": id, "quantity": q }))
        .collect();
    Json(body).into_response()
}

async fn list_items(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(rejection) = api.gate(&headers).await {
        return rejection;
    }
    let mut state = api.state.lock().unwrap();
    let ids = params.get("ids").cloned();
    state.item_queries.push(ids.clone());

    let wanted: Option<Vec<ItemId>> = ids.map(|csv| csv.split(',').map(parse_id).collect());
    let body: Vec<Value> = state
        .items
        .iter()
        .filter(|(id, ..)| wanted.as_ref().map_or(true, |w| w.contains(id)))
        .map(|(id, name, price, quantity)| {
            json!({ "id": id, "name": name, "model": format!("{name}-X"), "price": price, "quantity": quantity })
        })
        .collect();
    Json(body).into_response()
}

async fn upsert_entry(
    State(api): State<MockApi>,
    Path(item_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejection) = api.gate(&headers).await {
        return rejection;
    }
    let mut state = api.state.lock().unwrap();
    let item_id = parse_id(&item_id);
    state.puts.push((item_id.clone(), body.clone()));
    if state.fail_put.contains(&item_id) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "update failed" })),
        )
            .into_response();
    }
    let quantity = body["quantity"].as_i64().unwrap_or_default();
    set_entry(&mut state.cart, item_id, quantity);
    Json(json!({ "message": "updated" })).into_response()
}

async fn delete_entry(
    State(api): State<MockApi>,
    Path(item_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = api.gate(&headers).await {
        return rejection;
    }
    let item_id = parse_id(&item_id);
    let mut state = api.state.lock().unwrap();
    if state.fail_delete.contains(&item_id) {
        return (StatusCode::BAD_GATEWAY, Json(json!({ "message": "delete failed" })))
            .into_response();
    }
    state.cart.retain(|(id, _)| *id != item_id);
    StatusCode::NO_CONTENT.into_response()
}

async fn add_to_cart(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejection) = api.gate(&headers).await {
        return rejection;
    }
    let mut state = api.state.lock().unwrap();
    state.added.push(body.clone());

    let item_id = serde_json::from_value::<ItemId>(body["itemId"].clone()).ok();
    let quantity = body["quantity"].as_i64();
    match (item_id, quantity) {
        (Some(id), Some(q)) if state.items.iter().any(|(item, ..)| *item == id) => {
            set_entry(&mut state.cart, id, q);
            (StatusCode::CREATED, Json(json!({ "message": "added" }))).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Item not found" })),
        )
            .into_response(),
    }
}
