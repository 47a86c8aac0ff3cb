//! Records exchanged with the storefront API and the derived cart line.
//!
//! `InventoryRecord` and `CartEntry` mirror the wire shapes returned by the
//! Inventory Source and the Cart Store. `CartLine` is the engine-side view
//! model built by joining the two.
//!
//! ## Example
//!
//! ```ignore
//! use storefront_cart::{CartEntry, InventoryRecord, ItemId};
//!
//! let entry: CartEntry = serde_json::from_str(r#"{ "item_id": 1, "quantity": 5 }"#)?;
//! assert_eq!(entry.item_id, ItemId::from(1));
//! ```

mod line;

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use line::CartLine;

/// Identifier of a catalog item.
///
/// The API may key items numerically (`1`) or by string (`"sku-1"`).
/// Both shapes deserialize, and each serializes back in the shape it came in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Numeric(id) => write!(f, "{}", id),
            ItemId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        ItemId::Numeric(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::Text(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId::Text(id)
    }
}

/// Catalog record describing an item's price and available stock.
///
/// Owned by the Inventory Source; the engine only ever reads a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

/// Server-stored record of a user's intent to buy a quantity of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl CartEntry {
    pub fn new(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}
