//! The feed list: ties the list width to the factory and pre-loads rows
//! around the visible range.

use std::sync::Arc;

use tokio::task::JoinHandle;

use lamina::Padding;

use crate::async_row::AsyncRowView;
use crate::config::FeedConfig;
use crate::factory::AsyncRowFactory;
use crate::item::{FeedItem, RowPresenter, UpdateFlags};
use crate::preload::PreloadPool;

pub struct FeedList {
    items: Vec<FeedItem>,
    factory: Arc<AsyncRowFactory>,
    pool: PreloadPool,
    preload_count: usize,
    padding: Padding,
}

impl FeedList {
    pub fn new(items: Vec<FeedItem>, pool: PreloadPool, config: &FeedConfig) -> Self {
        Self {
            items,
            factory: pool.factory().clone(),
            pool,
            preload_count: config.preload_count,
            padding: Padding::ZERO,
        }
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn set_items(&mut self, items: Vec<FeedItem>) {
        self.items = items;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn factory(&self) -> &Arc<AsyncRowFactory> {
        &self.factory
    }

    pub fn pool(&self) -> &PreloadPool {
        &self.pool
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.padding = padding;
    }

    /// The list was laid out `width` pixels wide. Rows are built to fit
    /// inside the list padding.
    pub fn on_layout(&self, width: i32) {
        self.factory
            .set_target_width(width - self.padding.horizontal());
    }

    /// Positions to pre-load for a visible range, nearest first: up to
    /// `preload_count` after the range, then up to as many before it.
    pub fn preload_window(&self, first_visible: usize, visible_count: usize) -> Vec<usize> {
        let len = self.items.len();
        let first = first_visible.min(len);
        let end = first.saturating_add(visible_count).min(len);

        let after = end..end.saturating_add(self.preload_count).min(len);
        let before = (first.saturating_sub(self.preload_count)..first).rev();
        after.chain(before).collect()
    }

    /// The visible range moved; pre-load rows around it.
    pub fn on_scroll(&self, first_visible: usize, visible_count: usize) -> Vec<JoinHandle<()>> {
        let items = self
            .preload_window(first_visible, visible_count)
            .into_iter()
            .map(|position| self.items[position].clone());
        self.pool.preload_all(items)
    }

    /// Show the item at `position` in `view`. Returns `false` if there is
    /// no such item.
    pub fn bind(&self, position: usize, view: &mut AsyncRowView, flags: UpdateFlags) -> bool {
        match self.items.get(position) {
            Some(item) => {
                view.update(item, flags);
                true
            }
            None => false,
        }
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
    use crate::testing::{row_surface, sample_items};
    use lamina::ElementExt;

    fn list(count: usize, preload_count: usize) -> FeedList {
        let config = FeedConfig {
            preload_count,
            ..FeedConfig::default()
        };
        let factory = AsyncRowFactory::new(&config, Arc::new(feed_resources(&config.metrics)));
        let pool = PreloadPool::new(Arc::new(factory), &config).unwrap();
        FeedList::new(sample_items(0, count), pool, &config)
    }

    #[test]
    fn test_preload_window() {
        let list = list(20, 3);
        assert_eq!(list.preload_window(5, 4), vec![9, 10, 11, 4, 3, 2]);
        assert_eq!(list.preload_window(0, 4), vec![4, 5, 6]);
        assert_eq!(list.preload_window(17, 4), vec![16, 15, 14]);
        assert!(list.preload_window(30, 4).len() == 3);
    }

    #[test]
    fn test_layout_sets_target_width_inside_padding() {
        let mut list = list(2, 3);
        list.set_padding(Padding::new(10, 0, 6, 0));
        list.on_layout(316);
        assert_eq!(list.factory().target_width(), 300);
    }

    #[test]
    fn test_scroll_preloads_and_bind_hits_cache() {
        let list = list(10, 2);
        list.on_layout(300);
        let handles = list.on_scroll(0, 3);
        assert_eq!(handles.len(), 2);
        list.pool().wait(handles);

        let cached = list.factory().load_from_memory(3).unwrap();
        let surface = row_surface(&FeedConfig::default().metrics);
        let mut view = AsyncRowView::new(surface, list.factory().clone());
        view.view_mut().attach();

        assert!(list.bind(3, &mut view, UpdateFlags::NO_IMAGE_LOADING));
        assert!(Arc::ptr_eq(view.row().unwrap(), &cached));
        assert_eq!(lock_row(&cached).measured_width(), 300);
        assert!(!list.bind(10, &mut view, UpdateFlags::NO_IMAGE_LOADING));
    }
}
