//! Reconciliation pipeline: join cart entries with inventory.
//!
//! The engine runs three stages on every load: fetch entries, fetch the
//! inventory records they reference, then `merge`. `merge` and `grand_total`
//! are pure so they can be tested without any I/O.
//!
//! ## Example
//!
//! ```ignore
//! use storefront_cart::reconcile::{grand_total, merge, referenced_ids};
//!
//! let ids = referenced_ids(&entries);
//! let records = inventory.items(&ids).await?;
//! let lines = merge(&entries, &records);
//! let total = grand_total(&lines);
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use rust_decimal::Decimal;

use crate::model::{CartEntry, CartLine, InventoryRecord, ItemId};

/// Lookup index over an inventory snapshot, keyed by item id.
pub struct InventoryIndex<'a> {
    by_id: HashMap<&'a ItemId, &'a InventoryRecord>,
}

impl<'a> InventoryIndex<'a> {
    pub fn new(records: &'a [InventoryRecord]) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            by_id.entry(&record.id).or_insert(record);
        }
        Self { by_id }
    }

    pub fn get(&self, id: &ItemId) -> Option<&'a InventoryRecord> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Distinct item ids referenced by the entries, in sorted order.
pub fn referenced_ids(entries: &[CartEntry]) -> Vec<ItemId> {
    entries
        .iter()
        .map(|entry| entry.item_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Join entries with inventory into cart lines, preserving entry order.
///
/// Entries whose item is missing from `inventory` become retired lines
/// (zero price and stock). A repeated `item_id` keeps its first entry.
pub fn merge(entries: &[CartEntry], inventory: &[InventoryRecord]) -> Vec<CartLine> {
    let index = InventoryIndex::new(inventory);
    let mut seen = HashSet::with_capacity(entries.len());
    let mut lines = Vec::with_capacity(entries.len());

    for entry in entries {
        if !seen.insert(&entry.item_id) {
            tracing::warn!(item_id = %entry.item_id, "duplicate cart entry ignored");
            continue;
        }

        let record = index.get(&entry.item_id);
        if record.is_none() {
            tracing::warn!(item_id = %entry.item_id, "cart entry references unknown item");
        }
        lines.push(CartLine::from_parts(entry, record));
    }

    lines
}

/// Sum of `min(quantity, available) × price` over all lines.
///
/// Shortfall quantity never contributes. A sum beyond the `Decimal` range
/// is pinned to `Decimal::MAX` or `Decimal::MIN`.
pub fn grand_total(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .map(CartLine::satisfiable_total)
        .fold(Decimal::ZERO, |total, line| {
            total.checked_add(line).unwrap_or(if line.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            })
        })
}
