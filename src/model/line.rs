use rust_decimal::Decimal;
use serde::Serialize;

use super::{CartEntry, InventoryRecord, ItemId};

/// A cart entry joined with its inventory record.
///
/// `out_of_stock_qty` and `total_price` are derived from `quantity`,
/// `available_quantity` and `price`. Fields are only reachable through
/// accessors, and `set_quantity` re-derives both in the same call, so a line
/// never exposes stale derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    item_id: ItemId,
    quantity: i64,
    name: Option<String>,
    model: Option<String>,
    price: Decimal,
    available_quantity: i64,
    out_of_stock_qty: i64,
    total_price: Decimal,
    in_catalog: bool,
}

impl CartLine {
    /// Join an entry with its inventory record.
    ///
    /// A missing record means the item was retired from the catalog: price
    /// and availability are treated as zero, but the line is kept so it can
    /// still be removed.
    pub fn from_parts(entry: &CartEntry, record: Option<&InventoryRecord>) -> Self {
        let mut line = CartLine {
            item_id: entry.item_id.clone(),
            quantity: 0,
            name: record.map(|r| r.name.clone()),
            model: record.map(|r| r.model.clone()),
            price: record.map(|r| r.price).unwrap_or(Decimal::ZERO),
            available_quantity: record.map(|r| i64::from(r.quantity)).unwrap_or(0),
            out_of_stock_qty: 0,
            total_price: Decimal::ZERO,
            in_catalog: record.is_some(),
        };
        line.set_quantity(i64::from(entry.quantity));
        line
    }

    /// Set the ordered quantity and re-derive shortfall and line total.
    ///
    /// Any value is accepted, including zero and negatives; the shortfall is
    /// floored at zero.
    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.out_of_stock_qty = quantity.saturating_sub(self.available_quantity).max(0);
        self.total_price = saturating_mul(quantity, self.price);
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn available_quantity(&self) -> i64 {
        self.available_quantity
    }

    /// Portion of the ordered quantity that exceeds current stock.
    pub fn out_of_stock_qty(&self) -> i64 {
        self.out_of_stock_qty
    }

    /// `quantity × price`, shortfall included.
    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// `min(quantity, available) × price`: the part of the line that counts
    /// toward the grand total.
    pub fn satisfiable_total(&self) -> Decimal {
        saturating_mul(self.quantity.min(self.available_quantity), self.price)
    }

    /// False when the item no longer exists in inventory.
    pub fn in_catalog(&self) -> bool {
        self.in_catalog
    }

    pub fn has_shortfall(&self) -> bool {
        self.out_of_stock_qty > 0
    }

    /// Nothing left in stock for this item.
    pub fn is_unavailable(&self) -> bool {
        self.available_quantity == 0
    }

    /// The `−` stepper stops at one.
    pub fn can_decrement(&self) -> bool {
        self.quantity > 1
    }

    /// The `+` stepper stops at available stock.
    pub fn can_increment(&self) -> bool {
        self.quantity < self.available_quantity
    }
}

/// `quantity × price`, pinned to the `Decimal` range instead of overflowing.
fn saturating_mul(quantity: i64, price: Decimal) -> Decimal {
    Decimal::from(quantity).checked_mul(price).unwrap_or({
        if (quantity < 0) != price.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}
