//! Builds pre-measured rows, off the primary thread when asked to.

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use lamina::{ElementExt, HeadlessHost, Host, MeasureSpec, Resources};

use crate::async_row::{AsyncRowElement, BuildOrigin, SharedRow};
use crate::cache::ElementCache;
use crate::config::{FeedConfig, RowMetrics};
use crate::item::{FeedItem, ItemId, RowPresenter, UpdateFlags};
use crate::row::RowElement;

/// Creates rows at the current target width and keeps them in an
/// [`ElementCache`].
///
/// Rows are built against a [`HeadlessHost`], so `create` is safe to call
/// from worker threads. The thread that constructs the factory counts as
/// the primary thread.
pub struct AsyncRowFactory {
    host: Arc<HeadlessHost>,
    cache: Arc<ElementCache<AsyncRowElement>>,
    metrics: RowMetrics,
    primary: ThreadId,
}

impl AsyncRowFactory {
    pub fn new(config: &FeedConfig, resources: Arc<Resources>) -> Self {
        Self {
            host: Arc::new(HeadlessHost::new(resources)),
            cache: Arc::new(ElementCache::new(config.cache_capacity)),
            metrics: config.metrics.clone(),
            primary: thread::current().id(),
        }
    }

    pub fn cache(&self) -> &Arc<ElementCache<AsyncRowElement>> {
        &self.cache
    }

    pub fn target_width(&self) -> i32 {
        self.host.current_target_width()
    }

    /// Publish a new row width and drop every row built for the old one.
    /// Does nothing if the width is unchanged.
    pub fn set_target_width(&self, width: i32) {
        if self.host.current_target_width() == width.max(0) {
            return;
        }
        self.host.set_target_width(width);
        self.cache.evict_all();
        tracing::debug!(width, "row target width changed");
    }

    /// The cached row for `id`, without building one.
    pub fn load_from_memory(&self, id: ItemId) -> Option<SharedRow> {
        self.cache.get(id)
    }

    /// The cached row for `item`, or a newly built, measured and laid out
    /// one that is also cached.
    pub fn create(&self, item: &FeedItem) -> SharedRow {
        if let Some(row) = self.cache.get(item.id) {
            return row;
        }

        // Read the generation before the width so a concurrent width change
        // makes the insert below a no-op.
        let generation = self.cache.generation();
        let width = self.host.current_target_width();

        let host: Arc<dyn Host> = self.host.clone();
        let mut row = RowElement::new(self.metrics.clone());
        row.swap_host(Some(&host));
        row.update(item, UpdateFlags::NO_IMAGE_LOADING);
        row.measure(MeasureSpec::exactly(width), MeasureSpec::unspecified());
        let size = row.measured_size();
        row.layout(0, 0, size.width, size.height);

        let origin = if thread::current().id() == self.primary {
            BuildOrigin::Primary
        } else {
            BuildOrigin::Worker
        };
        tracing::trace!(id = item.id, width, ?origin, "built row");

        let row = Arc::new(Mutex::new(AsyncRowElement::new(row, origin)));
        self.cache.put_if_current(item.id, row.clone(), generation);
        row
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::async_row::lock_row;
    use crate::row::feed_resources;
    use lamina::Visibility;

    fn factory() -> AsyncRowFactory {
        let config = FeedConfig::default();
        AsyncRowFactory::new(&config, Arc::new(feed_resources(&config.metrics)))
    }

    #[test]
    fn test_create_is_cached() {
        let factory = factory();
        factory.set_target_width(300);
        let item = FeedItem::new(1, "A", "hello", "p");

        assert!(factory.load_from_memory(1).is_none());
        let first = factory.create(&item);
        let second = factory.create(&item);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(factory.load_from_memory(1).is_some());
    }

    #[test]
    fn test_rows_built_at_target_width() {
        let factory = factory();
        factory.set_target_width(280);
        let row = factory.create(&FeedItem::new(1, "A", "hello", "p"));
        let row = lock_row(&row);
        assert_eq!(row.measured_width(), 280);
        assert_eq!(row.bounds().width(), 280);
        assert_eq!(row.bounds().height(), row.measured_height());
        assert_eq!(row.row().post_image().visibility(), Visibility::Gone);
        assert_eq!(row.row().author_text().text(), "A");
    }

    #[test]
    fn test_width_change_evicts() {
        let factory = factory();
        factory.set_target_width(300);
        factory.create(&FeedItem::new(1, "A", "hello", "p"));

        factory.set_target_width(300);
        assert!(factory.cache().contains(1));

        factory.set_target_width(320);
        assert_eq!(factory.target_width(), 320);
        assert!(factory.load_from_memory(1).is_none());
    }

    #[test]
    fn test_worker_origin() {
        let factory = Arc::new(factory());
        factory.set_target_width(300);
        let worker = factory.clone();
        let row = thread::spawn(move || worker.create(&FeedItem::new(5, "A", "hi", "p")))
            .join()
            .unwrap();
        assert_eq!(lock_row(&row).origin(), BuildOrigin::Worker);
        assert_eq!(lock_row(&factory.create(&FeedItem::new(6, "B", "hi", "p"))).origin(), BuildOrigin::Primary);
    }
}
