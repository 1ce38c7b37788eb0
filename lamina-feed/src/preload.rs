//! Background row construction.
//!
//! The pool builds rows ahead of scrolling on a small blocking pool so the
//! primary thread finds them in the cache. The built rows are not returned;
//! warming the cache is the only effect.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::factory::AsyncRowFactory;
use crate::item::FeedItem;

pub struct PreloadPool {
    runtime: Runtime,
    factory: Arc<AsyncRowFactory>,
}

impl PreloadPool {
    pub fn new(factory: Arc<AsyncRowFactory>, config: &FeedConfig) -> Result<Self, FeedError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.workers())
            .thread_name("lamina-preload")
            .build()?;
        Ok(Self { runtime, factory })
    }

    pub fn factory(&self) -> &Arc<AsyncRowFactory> {
        &self.factory
    }

    /// Build `item`'s row in the background unless it is already cached.
    pub fn preload(&self, item: FeedItem) -> Option<JoinHandle<()>> {
        if self.factory.load_from_memory(item.id).is_some() {
            return None;
        }
        tracing::trace!(id = item.id, "scheduling row preload");
        let factory = self.factory.clone();
        Some(self.runtime.spawn_blocking(move || {
            factory.create(&item);
        }))
    }

    pub fn preload_all(&self, items: impl IntoIterator<Item = FeedItem>) -> Vec<JoinHandle<()>> {
        items.into_iter().filter_map(|item| self.preload(item)).collect()
    }

    /// Block until every handle has finished.
    pub fn wait(&self, handles: Vec<JoinHandle<()>>) {
        self.runtime.block_on(async {
            for handle in handles {
                if let Err(error) = handle.await {
                    tracing::warn!(%error, "row preload task failed");
                }
            }
        });
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::async_row::{lock_row, BuildOrigin};
    use crate::row::feed_resources;
    use crate::testing::sample_items;

    fn pool() -> PreloadPool {
        let config = FeedConfig::default();
        let factory = AsyncRowFactory::new(&config, Arc::new(feed_resources(&config.metrics)));
        factory.set_target_width(300);
        PreloadPool::new(Arc::new(factory), &config).unwrap()
    }

    #[test]
    fn test_preload_warms_cache_off_primary_thread() {
        let pool = pool();
        let items = sample_items(1, 4);
        let handles = pool.preload_all(items.clone());
        assert_eq!(handles.len(), 4);
        pool.wait(handles);

        for item in &items {
            let row = pool.factory().load_from_memory(item.id).unwrap();
            assert_eq!(lock_row(&row).origin(), BuildOrigin::Worker);
        }
    }

    #[test]
    fn test_cached_items_are_skipped() {
        let pool = pool();
        let items = sample_items(1, 2);
        pool.factory().create(&items[0]);
        let handles = pool.preload_all(items);
        assert_eq!(handles.len(), 1);
        pool.wait(handles);
        assert_eq!(pool.factory().cache().len(), 2);
    }
}
