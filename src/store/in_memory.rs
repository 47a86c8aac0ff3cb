//! InMemoryStorefront - HashMap-backed catalog and cart for testing and development.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{CartStore, InventorySource, StoreError};
use crate::model::{CartEntry, InventoryRecord, ItemId};

/// An operation that can be forced to fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Failpoint {
    Entries,
    Items,
    AllItems,
    Upsert(ItemId),
    Delete(ItemId),
    Add(ItemId),
}

#[derive(Default)]
struct State {
    items: BTreeMap<ItemId, InventoryRecord>,
    cart: Vec<CartEntry>,
    failpoints: HashSet<Failpoint>,
    entry_fetches: usize,
    upserts: Vec<(ItemId, i64)>,
}

/// In-memory storefront implementing both collaborator traits.
///
/// Cart entries keep insertion order, like a server returning rows in
/// creation order. Clone-friendly via Arc: clones share state, so a test can
/// keep a handle while the engine owns another.
#[derive(Clone, Default)]
pub struct InMemoryStorefront {
    state: Arc<RwLock<State>>,
}

impl InMemoryStorefront {
    /// Create an empty storefront.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a catalog record.
    pub fn put_item(&self, record: InventoryRecord) -> Result<(), StoreError> {
        self.write()?.items.insert(record.id.clone(), record);
        Ok(())
    }

    /// Remove a catalog record, leaving any cart entries that reference it.
    pub fn retire_item(&self, id: &ItemId) -> Result<bool, StoreError> {
        Ok(self.write()?.items.remove(id).is_some())
    }

    /// Set the stock level of a catalog record.
    pub fn set_stock(&self, id: &ItemId, quantity: u32) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        match state.items.get_mut(id) {
            Some(record) => {
                record.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Seed a cart entry directly, bypassing failpoints and the call log.
    pub fn put_entry(&self, entry: CartEntry) -> Result<(), StoreError> {
        let mut state = self.write()?;
        set_entry(&mut state.cart, &entry.item_id, entry.quantity);
        Ok(())
    }

    /// Current cart contents.
    pub fn cart(&self) -> Result<Vec<CartEntry>, StoreError> {
        Ok(self.read()?.cart.clone())
    }

    /// Quantity stored for one item, if it is in the cart.
    pub fn quantity_of(&self, id: &ItemId) -> Result<Option<u32>, StoreError> {
        Ok(self
            .read()?
            .cart
            .iter()
            .find(|entry| &entry.item_id == id)
            .map(|entry| entry.quantity))
    }

    /// Make an operation fail until cleared.
    pub fn fail(&self, point: Failpoint) -> Result<(), StoreError> {
        self.write()?.failpoints.insert(point);
        Ok(())
    }

    /// Let a previously failing operation succeed again.
    pub fn clear_failure(&self, point: &Failpoint) -> Result<(), StoreError> {
        self.write()?.failpoints.remove(point);
        Ok(())
    }

    /// Number of times the cart entries were listed.
    pub fn entry_fetches(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.entry_fetches)
    }

    /// Every upsert received, in arrival order, including failed ones.
    pub fn upserts(&self) -> Result<Vec<(ItemId, i64)>, StoreError> {
        Ok(self.read()?.upserts.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Transport("in-memory storefront lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Transport("in-memory storefront lock poisoned".into()))
    }
}

fn injected(point: &Failpoint) -> StoreError {
    StoreError::Status {
        status: 500,
        message: format!("injected failure: {:?}", point),
    }
}

fn check(state: &State, point: Failpoint) -> Result<(), StoreError> {
    if state.failpoints.contains(&point) {
        Err(injected(&point))
    } else {
        Ok(())
    }
}

fn stored_quantity(item_id: &ItemId, quantity: i64) -> Result<u32, StoreError> {
    u32::try_from(quantity).map_err(|_| StoreError::Status {
        status: 400,
        message: format!("invalid quantity {} for item {}", quantity, item_id),
    })
}

fn set_entry(cart: &mut Vec<CartEntry>, item_id: &ItemId, quantity: u32) {
    match cart.iter_mut().find(|entry| &entry.item_id == item_id) {
        Some(entry) => entry.quantity = quantity,
        None => cart.push(CartEntry {
            item_id: item_id.clone(),
            quantity,
        }),
    }
}

#[async_trait]
impl InventorySource for InMemoryStorefront {
    async fn items(&self, ids: &[ItemId]) -> Result<Vec<InventoryRecord>, StoreError> {
        let state = self.read()?;
        check(&state, Failpoint::Items)?;
        Ok(ids
            .iter()
            .filter_map(|id| state.items.get(id).cloned())
            .collect())
    }

    async fn all_items(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        let state = self.read()?;
        check(&state, Failpoint::AllItems)?;
        Ok(state.items.values().cloned().collect())
    }
}

#[async_trait]
impl CartStore for InMemoryStorefront {
    async fn entries(&self) -> Result<Vec<CartEntry>, StoreError> {
        let mut state = self.write()?;
        state.entry_fetches += 1;
        check(&state, Failpoint::Entries)?;
        Ok(state.cart.clone())
    }

    async fn upsert(&self, item_id: &ItemId, quantity: i64) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.upserts.push((item_id.clone(), quantity));
        check(&state, Failpoint::Upsert(item_id.clone()))?;
        let quantity = stored_quantity(item_id, quantity)?;
        set_entry(&mut state.cart, item_id, quantity);
        Ok(())
    }

    async fn delete(&self, item_id: &ItemId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        check(&state, Failpoint::Delete(item_id.clone()))?;
        state.cart.retain(|entry| &entry.item_id != item_id);
        Ok(())
    }

    async fn add(&self, item_id: &ItemId, quantity: i64) -> Result<(), StoreError> {
        let mut state = self.write()?;
        check(&state, Failpoint::Add(item_id.clone()))?;
        if !state.items.contains_key(item_id) {
            return Err(StoreError::Status {
                status: 404,
                message: format!("item {} not found", item_id),
            });
        }
        let quantity = stored_quantity(item_id, quantity)?;
        set_entry(&mut state.cart, item_id, quantity);
        Ok(())
    }
}
