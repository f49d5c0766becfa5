use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use common::{PriceFeed, Result};

use crate::PriceSource;

type PriceBook = Arc<RwLock<HashMap<String, HashMap<String, Decimal>>>>;

#[derive(Default)]
struct FeedState {
    exchanges: Vec<String>,
    tasks: Vec<JoinHandle<()>>,
}

/// Background price feed covering the exchanges chosen during configuration.
///
/// Each `start` aborts the previous polling tasks and spawns one task per
/// tracked exchange, so the latest `set_exchanges_to_feed` always wins.
pub struct ExchangePriceManager {
    runtime: Handle,
    poll_interval: Duration,
    sources: HashMap<String, Arc<dyn PriceSource>>,
    state: Mutex<FeedState>,
    prices: PriceBook,
}

impl ExchangePriceManager {
    /// Tasks are spawned on `runtime`, so `start` can be called from
    /// synchronous config hooks.
    pub fn new(runtime: Handle, poll_interval: Duration) -> Self {
        Self {
            runtime,
            poll_interval,
            sources: HashMap::new(),
            state: Mutex::new(FeedState::default()),
            prices: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn PriceSource>) -> Self {
        self.sources.insert(source.exchange().to_string(), source);
        self
    }

    pub fn exchanges(&self) -> Vec<String> {
        self.state.lock().exchanges.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().tasks.iter().any(|t| !t.is_finished())
    }

    pub fn get_price(&self, exchange: &str, pair: &str) -> Option<Decimal> {
        self.prices.read().get(exchange)?.get(pair).copied()
    }

    /// Abort every polling task.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        for task in state.tasks.drain(..) {
            task.abort();
        }
        info!("Price feed stopped");
    }
}

impl PriceFeed for ExchangePriceManager {
    fn set_exchanges_to_feed(&self, exchanges: Vec<String>) {
        let mut deduped: Vec<String> = Vec::with_capacity(exchanges.len());
        for exchange in exchanges {
            if !deduped.contains(&exchange) {
                deduped.push(exchange);
            }
        }
        debug!(exchanges = ?deduped, "Price feed exchanges set");
        self.state.lock().exchanges = deduped;
    }

    fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        for task in state.tasks.drain(..) {
            task.abort();
        }

        let tracked = state.exchanges.clone();
        self.prices.write().retain(|exchange, _| tracked.contains(exchange));

        for exchange in &tracked {
            let Some(source) = self.sources.get(exchange).cloned() else {
                warn!(exchange = %exchange, "No price source for exchange, not fed");
                continue;
            };
            let task = self.runtime.spawn(poll_loop(
                exchange.clone(),
                source,
                self.prices.clone(),
                self.poll_interval,
            ));
            state.tasks.push(task);
        }

        info!(exchanges = ?tracked, tasks = state.tasks.len(), "Price feed started");
        Ok(())
    }
}

impl Drop for ExchangePriceManager {
    fn drop(&mut self) {
        for task in self.state.get_mut().tasks.drain(..) {
            task.abort();
        }
    }
}

async fn poll_loop(
    exchange: String,
    source: Arc<dyn PriceSource>,
    prices: PriceBook,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        ticker.tick().await;
        match source.fetch_prices().await {
            Ok(snapshot) => {
                debug!(exchange = %exchange, pairs = snapshot.len(), "Prices updated");
                prices.write().insert(exchange.clone(), snapshot);
            }
            Err(e) => {
                warn!(exchange = %exchange, error = %e, "Price fetch failed");
            }
        }
    }
}
