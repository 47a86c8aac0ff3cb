//! Cart reconciliation engine.
//!
//! `CartEngine` owns the merged cart lines, the grand total and the set of
//! local edits for one user session. The UI drives it:
//!
//! 1. `load()` fetches entries and inventory and rebuilds everything.
//! 2. `adjust(id, qty)` edits a line locally and marks it dirty.
//! 3. `commit()` pushes only the dirty lines, then reloads.
//! 4. `remove_item(id)` deletes a line on the server, then locally.
//!
//! ## Example
//!
//! ```ignore
//! use storefront_cart::{CartEngine, InMemoryStorefront, ItemId};
//!
//! let store = InMemoryStorefront::new();
//! let mut cart = CartEngine::new(store.clone(), store);
//!
//! cart.load().await;
//! cart.adjust(&ItemId::from(1), 2);
//! if cart.can_commit() {
//!     cart.commit().await?;
//! }
//! ```
//!
//! Mutating operations take `&mut self`, so one engine can never run two of
//! them at once. [`SharedCart`] extends that guarantee to an engine shared
//! between tasks.

mod dirty;
mod shared;

use futures_util::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::EngineOptions;
use crate::error::CartError;
use crate::model::{CartLine, ItemId};
use crate::reconcile::{grand_total, merge, referenced_ids};
use crate::store::{CartStore, InventorySource};

pub use dirty::DirtySet;
pub use shared::SharedCart;

/// Outcome of a load.
///
/// A failed load never propagates: the cart is emptied and the cause is
/// reported here instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Lines were rebuilt from the server. `retired` lists cart entries
    /// whose item no longer exists in inventory.
    Fresh { retired: Vec<ItemId> },
    /// A fetch failed; the cart is empty with a zero total.
    Degraded(CartError),
}

impl LoadStatus {
    pub fn is_fresh(&self) -> bool {
        matches!(self, LoadStatus::Fresh { .. })
    }

    pub fn error(&self) -> Option<&CartError> {
        match self {
            LoadStatus::Degraded(e) => Some(e),
            LoadStatus::Fresh { .. } => None,
        }
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Items whose pending quantity was accepted by the Cart Store.
    pub submitted: Vec<ItemId>,
    /// Result of the reload that follows a commit. `None` when there was
    /// nothing to submit.
    pub reload: Option<LoadStatus>,
}

/// Serializable view of the cart for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub grand_total: Decimal,
    pub pending: DirtySet,
    pub has_shortfall: bool,
    pub can_commit: bool,
}

/// Reconciles a user's server-side cart with live inventory.
pub struct CartEngine<I, C> {
    inventory: I,
    cart: C,
    options: EngineOptions,
    lines: Vec<CartLine>,
    dirty: DirtySet,
    grand_total: Decimal,
}

impl<I, C> CartEngine<I, C>
where
    I: InventorySource,
    C: CartStore,
{
    /// Create an empty engine. Nothing is fetched until `load()`.
    pub fn new(inventory: I, cart: C) -> Self {
        Self::with_options(inventory, cart, EngineOptions::default())
    }

    pub fn with_options(inventory: I, cart: C, options: EngineOptions) -> Self {
        Self {
            inventory,
            cart,
            options,
            lines: Vec::new(),
            dirty: DirtySet::new(),
            grand_total: Decimal::ZERO,
        }
    }

    /// Rebuild lines and grand total from the server and drop local edits.
    pub async fn load(&mut self) -> LoadStatus {
        let fetched = self.fetch_lines().await;
        self.dirty.clear();

        match fetched {
            Ok(lines) => {
                let retired: Vec<ItemId> = lines
                    .iter()
                    .filter(|line| !line.in_catalog())
                    .map(|line| line.item_id().clone())
                    .collect();
                self.grand_total = grand_total(&lines);
                self.lines = lines;
                tracing::info!(
                    lines = self.lines.len(),
                    retired = retired.len(),
                    grand_total = %self.grand_total,
                    "cart loaded"
                );
                LoadStatus::Fresh { retired }
            }
            Err(err) => {
                tracing::warn!(error = %err, "cart load failed, showing empty cart");
                self.lines.clear();
                self.grand_total = Decimal::ZERO;
                LoadStatus::Degraded(err)
            }
        }
    }

    async fn fetch_lines(&self) -> Result<Vec<CartLine>, CartError> {
        let entries = self.cart.entries().await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let ids = referenced_ids(&entries);
        let records = self.inventory.items(&ids).await?;
        Ok(merge(&entries, &records))
    }

    /// Set a line's quantity locally and mark it dirty.
    ///
    /// Shortfall, line total and grand total are re-derived for whatever
    /// value is given, zero and negatives included. Returns `None` and
    /// changes nothing if `item_id` is not in the cart.
    pub fn adjust(&mut self, item_id: &ItemId, quantity: i64) -> Option<&CartLine> {
        let Some(index) = self.position(item_id) else {
            tracing::debug!(item_id = %item_id, "adjust ignored for item not in cart");
            return None;
        };

        self.lines[index].set_quantity(quantity);
        self.dirty.mark(item_id.clone(), quantity);
        self.grand_total = grand_total(&self.lines);
        tracing::debug!(item_id = %item_id, quantity, grand_total = %self.grand_total, "cart line adjusted");

        Some(&self.lines[index])
    }

    /// Move a line's quantity by `delta` (the `+`/`−` stepper).
    pub fn step(&mut self, item_id: &ItemId, delta: i64) -> Option<&CartLine> {
        let current = self.line(item_id)?.quantity();
        self.adjust(item_id, current.saturating_add(delta))
    }

    /// Push every pending edit to the Cart Store, then reload.
    ///
    /// Upserts run concurrently and all of them are awaited. If any fails the
    /// commit fails with [`CartError::PartialCommit`]: upserts that succeeded
    /// stay applied on the server, and the local edits are kept. Call
    /// `load()` to observe what the server actually holds.
    pub async fn commit(&mut self) -> Result<CommitReport, CartError> {
        if self.dirty.is_empty() {
            return Ok(CommitReport {
                submitted: Vec::new(),
                reload: None,
            });
        }

        if self.options.reject_shortfall_commits {
            let short = self.shortfall_ids();
            if !short.is_empty() {
                tracing::warn!(lines = short.len(), "commit refused, cart exceeds stock");
                return Err(CartError::Shortfall(short));
            }
        }

        let pending: Vec<(ItemId, i64)> = self
            .dirty
            .iter()
            .map(|(id, quantity)| (id.clone(), *quantity))
            .collect();
        let cart = &self.cart;
        let results = join_all(pending.iter().map(|(id, quantity)| async move {
            (id.clone(), cart.upsert(id, *quantity).await)
        }))
        .await;

        let mut applied = Vec::new();
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => applied.push(id),
                Err(err) => {
                    tracing::warn!(item_id = %id, error = %err, "cart upsert failed");
                    failed.push((id, err));
                }
            }
        }

        if !failed.is_empty() {
            return Err(CartError::PartialCommit { applied, failed });
        }

        tracing::info!(submitted = applied.len(), "cart committed");
        self.dirty.clear();
        let reload = self.load().await;
        Ok(CommitReport {
            submitted: applied,
            reload: Some(reload),
        })
    }

    /// Delete an item from the server-side cart, then drop it locally.
    ///
    /// On failure nothing local changes.
    pub async fn remove_item(&mut self, item_id: &ItemId) -> Result<(), CartError> {
        if let Err(err) = self.cart.delete(item_id).await {
            tracing::warn!(item_id = %item_id, error = %err, "cart delete failed");
            return Err(err.into());
        }

        self.lines.retain(|line| line.item_id() != item_id);
        self.dirty.remove(item_id);
        self.grand_total = grand_total(&self.lines);
        tracing::info!(item_id = %item_id, grand_total = %self.grand_total, "cart item removed");
        Ok(())
    }
}

impl<I, C> CartEngine<I, C> {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: &ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item_id() == item_id)
    }

    fn position(&self, item_id: &ItemId) -> Option<usize> {
        self.lines.iter().position(|line| line.item_id() == item_id)
    }

    /// Sum of satisfiable line totals.
    pub fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Any line asks for more than is in stock.
    pub fn has_shortfall(&self) -> bool {
        self.lines.iter().any(CartLine::has_shortfall)
    }

    /// Ids of lines asking for more than is in stock.
    pub fn shortfall_ids(&self) -> Vec<ItemId> {
        self.lines
            .iter()
            .filter(|line| line.has_shortfall())
            .map(|line| line.item_id().clone())
            .collect()
    }

    /// Lines whose item no longer exists in inventory.
    pub fn retired_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|line| !line.in_catalog())
    }

    /// Whether the UI should offer "update cart": there are pending edits
    /// and no line exceeds stock.
    pub fn can_commit(&self) -> bool {
        self.has_pending_changes() && !self.has_shortfall()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            grand_total: self.grand_total,
            pending: self.dirty.clone(),
            has_shortfall: self.has_shortfall(),
            can_commit: self.can_commit(),
        }
    }
}
