use std::error::Error;
use std::fmt;

use crate::model::ItemId;
use crate::store::StoreError;

/// Error type for cart engine and catalog operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// A request to the Inventory Source or Cart Store failed.
    Fetch(StoreError),
    /// A cart entry references an item with no inventory record.
    NotFound(ItemId),
    /// At least one upsert in a commit failed. Upserts listed in `applied`
    /// were accepted by the server and are not rolled back.
    PartialCommit {
        applied: Vec<ItemId>,
        failed: Vec<(ItemId, StoreError)>,
    },
    /// Commit refused because these lines exceed available stock.
    Shortfall(Vec<ItemId>),
    /// Another operation is in flight on this cart.
    Busy,
}

impl fmt::Display for CartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartError::Fetch(e) => write!(f, "fetch failed: {}", e),
            CartError::NotFound(id) => write!(f, "item not found in inventory: {}", id),
            CartError::PartialCommit { applied, failed } => write!(
                f,
                "cart commit failed for {} of {} item(s)",
                failed.len(),
                applied.len() + failed.len()
            ),
            CartError::Shortfall(ids) => {
                write!(f, "{} cart line(s) exceed available stock", ids.len())
            }
            CartError::Busy => write!(f, "another cart operation is in progress"),
        }
    }
}

impl Error for CartError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CartError::Fetch(e) => Some(e),
            CartError::PartialCommit { failed, .. } => {
                failed.first().map(|(_, e)| e as &(dyn Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<StoreError> for CartError {
    fn from(err: StoreError) -> Self {
        CartError::Fetch(err)
    }
}

impl CartError {
    /// True when the failure came from an expired or rejected credential.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            CartError::Fetch(e) => e.is_unauthorized(),
            CartError::PartialCommit { failed, .. } => {
                failed.iter().any(|(_, e)| e.is_unauthorized())
            }
            _ => false,
        }
    }
}
