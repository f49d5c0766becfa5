use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

/// Exchanges the configured strategy needs connected, in the order they
/// were chosen. Shared between config hooks and strategy construction.
///
/// Cleared at session start, appended to during resolution, otherwise
/// read-only.
#[derive(Debug, Clone, Default)]
pub struct RequiredExchanges {
    inner: Arc<RwLock<Vec<String>>>,
}

impl RequiredExchanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `exchange` as required. Re-adding a known exchange is a no-op.
    pub fn push(&self, exchange: impl Into<String>) {
        let exchange = exchange.into();
        let mut list = self.inner.write();
        if !list.contains(&exchange) {
            info!(exchange = %exchange, "Exchange marked as required");
            list.push(exchange);
        }
    }

    pub fn contains(&self, exchange: &str) -> bool {
        self.inner.read().iter().any(|e| e == exchange)
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub(crate) fn clear(&self) {
        self.inner.write().clear();
    }
}
