//! Catalog listing with a per-item quantity picker.
//!
//! Each item starts with the quantity already in the user's cart, or one if
//! it is not in the cart yet. The picker never goes below one or above the
//! item's stock, and `add_to_cart` sends the picked quantity to the Cart
//! Store.
//!
//! ## Example
//!
//! ```ignore
//! let mut catalog = Catalog::load(&api, &api).await?;
//! catalog.increment(&ItemId::from(3))?;
//! catalog.add_to_cart(&api, &ItemId::from(3)).await?;
//! ```

use serde::Serialize;

use crate::error::CartError;
use crate::model::{CartEntry, InventoryRecord, ItemId};
use crate::store::{CartStore, InventorySource};

/// One catalog record with its picked quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub record: InventoryRecord,
    /// Quantity currently in the cart, if any.
    pub in_cart: Option<u32>,
    selected: i64,
}

impl CatalogItem {
    pub fn selected(&self) -> i64 {
        self.selected
    }

    pub fn in_stock(&self) -> bool {
        self.record.quantity > 0
    }

    fn stock(&self) -> i64 {
        i64::from(self.record.quantity)
    }
}

/// The item listing page's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Fetch the whole catalog and the cart, and pre-select quantities.
    pub async fn load<I, C>(inventory: &I, cart: &C) -> Result<Self, CartError>
    where
        I: InventorySource + ?Sized,
        C: CartStore + ?Sized,
    {
        let records = inventory.all_items().await?;
        let entries = cart.entries().await?;
        tracing::debug!(items = records.len(), in_cart = entries.len(), "catalog loaded");
        Ok(Self::from_parts(records, &entries))
    }

    /// Build from already-fetched records and cart entries.
    pub fn from_parts(records: Vec<InventoryRecord>, entries: &[CartEntry]) -> Self {
        let items = records
            .into_iter()
            .map(|record| {
                let in_cart = entries
                    .iter()
                    .find(|entry| entry.item_id == record.id)
                    .map(|entry| entry.quantity);
                let selected = match in_cart {
                    Some(quantity) if quantity > 0 => i64::from(quantity),
                    _ => 1,
                };
                CatalogItem {
                    record,
                    in_cart,
                    selected,
                }
            })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|item| &item.record.id == item_id)
    }

    fn item_mut(&mut self, item_id: &ItemId) -> Result<&mut CatalogItem, CartError> {
        self.items
            .iter_mut()
            .find(|item| &item.record.id == item_id)
            .ok_or_else(|| CartError::NotFound(item_id.clone()))
    }

    /// Raise the picked quantity by one, capped at stock.
    pub fn increment(&mut self, item_id: &ItemId) -> Result<i64, CartError> {
        let item = self.item_mut(item_id)?;
        item.selected = (item.selected + 1).min(item.stock()).max(1);
        Ok(item.selected)
    }

    /// Lower the picked quantity by one, floored at one.
    pub fn decrement(&mut self, item_id: &ItemId) -> Result<i64, CartError> {
        let item = self.item_mut(item_id)?;
        item.selected = (item.selected - 1).max(1);
        Ok(item.selected)
    }

    /// Send the picked quantity of an item to the cart.
    pub async fn add_to_cart<C>(&mut self, cart: &C, item_id: &ItemId) -> Result<i64, CartError>
    where
        C: CartStore + ?Sized,
    {
        let item = self.item_mut(item_id)?;
        let quantity = item.selected;

        if let Err(err) = cart.add(item_id, quantity).await {
            tracing::warn!(item_id = %item_id, error = %err, "add to cart failed");
            return Err(err.into());
        }

        item.in_cart = u32::try_from(quantity).ok();
        tracing::info!(item_id = %item_id, quantity, "item added to cart");
        Ok(quantity)
    }
}
