use std::collections::btree_map::{self, BTreeMap};

use serde::Serialize;

use crate::model::ItemId;

/// Local quantity edits not yet pushed to the Cart Store.
///
/// Keyed by item id with the pending quantity. Iteration is ordered by id so
/// commits issue their upserts in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DirtySet {
    pending: BTreeMap<ItemId, i64>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending quantity, replacing any earlier edit of the same item.
    pub fn mark(&mut self, item_id: ItemId, quantity: i64) {
        self.pending.insert(item_id, quantity);
    }

    pub fn remove(&mut self, item_id: &ItemId) -> Option<i64> {
        self.pending.remove(item_id)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn get(&self, item_id: &ItemId) -> Option<i64> {
        self.pending.get(item_id).copied()
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.pending.contains_key(item_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.pending.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ItemId, i64> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<'a> IntoIterator for &'a DirtySet {
    type Item = (&'a ItemId, &'a i64);
    type IntoIter = btree_map::Iter<'a, ItemId, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.pending.iter()
    }
}
