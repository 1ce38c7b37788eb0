//! Integration tests for off-surface row pre-computation.
//!
//! Rows are built by the factory against its headless host, optionally on
//! the pre-load workers, and later shown by a row view attached to a real
//! surface. These tests drive that whole path with recording doubles.

use std::sync::{Arc, Once};

use lamina::{ElementExt, IntSize, Visibility};
use lamina_feed::testing::{row_surface, sample_items, StaticImageLoader};
use lamina_feed::{
    feed_resources, lock_row, AsyncRowFactory, AsyncRowView, BuildOrigin, FeedConfig, FeedItem,
    FeedList, LoadedFrom, PreloadPool, RowPresenter, UpdateFlags,
};

fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A factory at a fixed width plus its pool.
struct Harness {
    config: FeedConfig,
    factory: Arc<AsyncRowFactory>,
}

impl Harness {
    fn new(width: i32) -> Self {
        init_test_logging();
        let config = FeedConfig::default();
        let factory = AsyncRowFactory::new(&config, Arc::new(feed_resources(&config.metrics)));
        factory.set_target_width(width);
        Self {
            config,
            factory: Arc::new(factory),
        }
    }

    fn built_size(&self, item: &FeedItem) -> IntSize {
        lock_row(&self.factory.create(item)).measured_size()
    }
}

fn item() -> FeedItem {
    FeedItem::new(1, "A", "hello", "p")
}

#[test]
fn test_row_without_post_image_collapses_it() {
    let harness = Harness::new(300);
    let row = harness.factory.create(&item());
    let row = lock_row(&row);

    assert_eq!(row.row().post_image().visibility(), Visibility::Gone);
    assert_eq!(row.measured_width(), 300);

    let m = &harness.config.metrics;
    let inner = row.row();
    let content = inner.author_text().measured_height()
        + inner.message_text().measured_height()
        + m.content_margin
        + m.icon_size;
    assert_eq!(row.measured_height(), content.max(m.profile_image_size) + 2 * m.padding);
}

#[test]
fn test_post_image_adds_its_height_and_one_margin() {
    let harness = Harness::new(300);
    let without = harness.built_size(&item());

    let with_post = FeedItem {
        id: 2,
        ..item().with_post_image("q")
    };
    let with = harness.built_size(&with_post);

    let m = &harness.config.metrics;
    assert_eq!(with.width, without.width);
    assert_eq!(with.height - without.height, m.post_image_height + m.content_margin);
}

#[test]
fn test_empty_post_url_counts_as_absent() {
    let harness = Harness::new(300);
    let empty = FeedItem {
        id: 3,
        ..item().with_post_image("")
    };
    assert_eq!(harness.built_size(&empty), harness.built_size(&item()));
}

#[test]
fn test_view_shows_prebuilt_row_without_remeasuring() {
    let harness = Harness::new(300);
    let pool = PreloadPool::new(harness.factory.clone(), &harness.config).unwrap();
    let handles = pool.preload_all(vec![item()]);
    pool.wait(handles);

    let cached = harness.factory.load_from_memory(1).unwrap();
    assert_eq!(lock_row(&cached).origin(), BuildOrigin::Worker);
    let built = lock_row(&cached).measured_size();

    let surface = row_surface(&harness.config.metrics);
    let loader = Arc::new(StaticImageLoader::new(LoadedFrom::Network).with_image("p", 48, 48));
    let mut view = AsyncRowView::new(surface.clone(), harness.factory.clone()).with_image_loader(loader);
    view.view_mut().attach();
    view.update(&item(), UpdateFlags::NONE);
    assert!(Arc::ptr_eq(view.row().unwrap(), &cached));

    let size = view
        .view_mut()
        .measure(lamina::MeasureSpec::exactly(300), lamina::MeasureSpec::unspecified());
    assert_eq!(size, built);

    surface.reset();
    assert!(view.poll_images());
    let row = lock_row(&cached);
    assert!(row.row().profile_image().drawable().unwrap().is_running());
    assert!(!surface.invalidated_rects().is_empty());
}

#[test]
fn test_width_change_rebuilds_at_new_width() {
    let harness = Harness::new(300);
    let first = harness.factory.create(&item());

    harness.factory.set_target_width(200);
    let second = harness.factory.create(&item());

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(lock_row(&second).measured_width(), 200);
    assert!(lock_row(&second).measured_height() >= lock_row(&first).measured_height());
}

#[test]
fn test_list_scroll_warms_cache() {
    init_test_logging();
    let config = FeedConfig {
        cache_capacity: 64,
        ..FeedConfig::default()
    };
    let factory = Arc::new(AsyncRowFactory::new(&config, Arc::new(feed_resources(&config.metrics))));
    let pool = PreloadPool::new(factory.clone(), &config).unwrap();
    let list = FeedList::new(sample_items(100, 50), pool, &config);
    list.on_layout(320);

    let handles = list.on_scroll(10, 5);
    assert_eq!(handles.len(), 30 + 10);
    list.pool().wait(handles);

    for position in (15..45).chain(0..10) {
        let id = list.items()[position].id;
        assert!(factory.cache().contains(id), "position {position} not cached");
    }
    assert!(!factory.cache().contains(list.items()[12].id));
}

#[test]
fn test_rebinding_same_item_is_idempotent() {
    let harness = Harness::new(300);
    let row = harness.factory.create(&item());
    let mut guard = lock_row(&row);
    let before = guard.measured_size();
    guard.update(&item(), UpdateFlags::NO_IMAGE_LOADING);
    guard.update(&item(), UpdateFlags::NO_IMAGE_LOADING);
    assert_eq!(guard.measured_size(), before);
    assert_eq!(guard.row().pending_images(), 0);
}
