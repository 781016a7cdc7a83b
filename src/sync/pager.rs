//! Pagination Window
//!
//! A growing visible prefix over the cached item list, for user-driven
//! "load more" reveals. The reveal keeps the reference behavior of a fixed
//! simulated-latency step rather than a real paging request, so tests stay
//! deterministic under a paused clock.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::store::ItemStore;
use crate::protocol::Item;

#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Items visible before the first reveal.
    pub window: usize,
    /// Items added per reveal.
    pub increment: usize,
    /// Simulated network latency per reveal.
    pub reveal_delay: Duration,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            window: 9,
            increment: 3,
            reveal_delay: Duration::from_millis(500),
        }
    }
}

pub struct PageWindow {
    store: Arc<ItemStore>,
    config: PageConfig,
    reveal_count: usize,
    exhausted: bool,
}

impl PageWindow {
    pub fn new(store: Arc<ItemStore>, config: PageConfig) -> Self {
        let reveal_count = config.window;
        Self {
            store,
            config,
            reveal_count,
            exhausted: false,
        }
    }

    /// The first `reveal_count` cached items, clamped to what the cache
    /// currently holds.
    pub fn visible(&self) -> Vec<Item> {
        let items = self.store.snapshot().items.unwrap_or_default();
        let end = self.reveal_count.min(items.len());
        items[..end].to_vec()
    }

    pub fn reveal_count(&self) -> usize {
        self.reveal_count
    }

    pub fn exhausted(&self) -> bool {
        self.exhausted
    }

    /// Extend the window by one increment after the simulated latency.
    /// Once the whole cache is visible the window is exhausted and further
    /// calls are no-ops.
    pub async fn reveal_more(&mut self) {
        if self.exhausted {
            return;
        }

        let total = self.store.snapshot().items.map_or(0, |items| items.len());
        if self.reveal_count < total {
            tokio::time::sleep(self.config.reveal_delay).await;
            self.reveal_count += self.config.increment;
            debug!(reveal_count = self.reveal_count, total, "window extended");
        } else {
            self.exhausted = true;
            debug!("window exhausted");
        }
    }

    /// Shrink back to the initial window, e.g. after a refetch.
    pub fn reset(&mut self) {
        self.reveal_count = self.config.window;
        self.exhausted = false;
    }
}
