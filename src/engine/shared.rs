//! SharedCart - one engine shared between tasks.
//!
//! Only one operation may run against a cart at a time; an interleaved
//! `load()` and `commit()` would leave the dirty set pointing at lines that
//! no longer exist. `lock` waits for the in-flight operation to finish,
//! `try_lock` rejects with [`CartError::Busy`] instead.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use super::{CartEngine, CartSnapshot};
use crate::error::CartError;

/// A cart engine behind an async mutex. Clones share the same engine.
pub struct SharedCart<I, C> {
    inner: Arc<Mutex<CartEngine<I, C>>>,
}

impl<I, C> Clone for SharedCart<I, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, C> SharedCart<I, C> {
    pub fn new(engine: CartEngine<I, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Wait for exclusive access, queueing behind any in-flight operation.
    pub async fn lock(&self) -> MutexGuard<'_, CartEngine<I, C>> {
        self.inner.lock().await
    }

    /// Take exclusive access now, or fail with `Busy` if an operation is in flight.
    pub fn try_lock(&self) -> Result<MutexGuard<'_, CartEngine<I, C>>, CartError> {
        self.inner.try_lock().map_err(|_| {
            tracing::debug!("cart operation rejected, another is in flight");
            CartError::Busy
        })
    }

    /// Current view, or `Busy` while an operation is in flight.
    pub fn try_snapshot(&self) -> Result<CartSnapshot, CartError> {
        Ok(self.try_lock()?.snapshot())
    }
}
