pub mod catalog;
pub mod config;
pub mod engine;
mod error;
pub mod model;
pub mod reconcile;
mod session;
pub mod store;

pub use catalog::{Catalog, CatalogItem};
pub use config::{ApiConfig, ConfigError, EngineOptions};
pub use engine::{CartEngine, CartSnapshot, CommitReport, DirtySet, LoadStatus, SharedCart};
pub use error::CartError;
pub use model::{CartEntry, CartLine, InventoryRecord, ItemId};
pub use session::Session;
pub use store::{
    CartStore, Failpoint, HttpStorefront, InMemoryStorefront, InventorySource, StoreError,
};

// Re-export the decimal type used for prices and totals
pub use rust_decimal::Decimal;
