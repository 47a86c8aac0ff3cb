//! Collaborators the cart engine talks to.
//!
//! The engine sits between two external services:
//!
//! - an **Inventory Source** returning catalog records by id, and
//! - a **Cart Store** holding the current user's cart entries.
//!
//! Both are traits so the engine can run against the real REST API
//! ([`HttpStorefront`]) or an in-process stand-in ([`InMemoryStorefront`]).
//!
//! ## Example
//!
//! ```ignore
//! use storefront_cart::{ApiConfig, CartEngine, HttpStorefront, Session};
//!
//! let api = HttpStorefront::new(ApiConfig::from_env()?, Session::with_token(token))?;
//! let mut cart = CartEngine::new(api.clone(), api);
//! cart.load().await;
//! ```

mod http;
mod in_memory;

use std::error::Error;
use std::fmt;

use async_trait::async_trait;

use crate::model::{CartEntry, InventoryRecord, ItemId};

pub use http::HttpStorefront;
pub use in_memory::{Failpoint, InMemoryStorefront};

/// Read access to catalog records.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Records for the given ids. Ids with no record are simply absent.
    async fn items(&self, ids: &[ItemId]) -> Result<Vec<InventoryRecord>, StoreError>;

    /// Every record in the catalog.
    async fn all_items(&self) -> Result<Vec<InventoryRecord>, StoreError>;
}

/// The current user's server-side cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// All entries in the cart.
    async fn entries(&self) -> Result<Vec<CartEntry>, StoreError>;

    /// Set the quantity of an item, creating the entry if needed.
    async fn upsert(&self, item_id: &ItemId, quantity: i64) -> Result<(), StoreError>;

    /// Remove an item from the cart.
    async fn delete(&self, item_id: &ItemId) -> Result<(), StoreError>;

    /// Add a quantity of an item from the catalog page.
    async fn add(&self, item_id: &ItemId, quantity: i64) -> Result<(), StoreError>;
}

/// Failure talking to a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connection or protocol failure before a response arrived.
    Transport(String),
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The credential was missing, expired or rejected.
    Unauthorized(String),
    /// Non-success status other than an auth rejection.
    Status { status: u16, message: String },
    /// The response body could not be decoded.
    Decode(String),
    /// The id cannot be expressed in a request.
    InvalidItemId(ItemId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transport(msg) => write!(f, "transport error: {}", msg),
            StoreError::Timeout => write!(f, "request timed out"),
            StoreError::Unauthorized(msg) => write!(f, "unauthorized: {}", msg),
            StoreError::Status { status, message } if message.is_empty() => {
                write!(f, "unexpected server response: {}", status)
            }
            StoreError::Status { status, message } => {
                write!(f, "unexpected server response: {} ({})", status, message)
            }
            StoreError::Decode(msg) => write!(f, "decode failed: {}", msg),
            StoreError::InvalidItemId(id) => write!(f, "item id `{}` cannot be sent", id),
        }
    }
}

impl Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl StoreError {
    /// True for failures the session collaborator should answer with a re-login.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Unauthorized(_))
    }

    /// Map this error to an HTTP-style status code, if it has one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            StoreError::Unauthorized(_) => Some(401),
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
