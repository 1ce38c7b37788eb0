//! Pre-measured rows and the view that shows them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lamina::{
    Canvas, Color, Element, ElementCore, ElementExt, ElementView, IntSize, MeasureSpec, Rect,
    SharedElement, Surface,
};

use crate::factory::AsyncRowFactory;
use crate::images::ImageLoader;
use crate::item::{FeedItem, RowPresenter, UpdateFlags};
use crate::row::RowElement;

/// Which thread built a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildOrigin {
    Primary,
    Worker,
}

impl BuildOrigin {
    fn indicator_color(self) -> Color {
        match self {
            BuildOrigin::Primary => Color::from_argb(0xFFE5_3935),
            BuildOrigin::Worker => Color::from_argb(0xFF43_A047),
        }
    }
}

/// A row that was measured and laid out when it was built.
///
/// Measuring keeps the recorded size and laying out only records bounds;
/// the wrapped row is never re-measured. Drawing adds a small square in
/// the top-left corner colored by [`BuildOrigin`].
pub struct AsyncRowElement {
    row: RowElement,
    origin: BuildOrigin,
}

/// A pre-measured row shared between the cache and a view.
pub type SharedRow = Arc<Mutex<AsyncRowElement>>;

impl AsyncRowElement {
    pub fn new(row: RowElement, origin: BuildOrigin) -> Self {
        Self { row, origin }
    }

    pub fn row(&self) -> &RowElement {
        &self.row
    }

    pub fn row_mut(&mut self) -> &mut RowElement {
        &mut self.row
    }

    pub fn origin(&self) -> BuildOrigin {
        self.origin
    }
}

/// Lock a shared row, recovering from a poisoned lock.
pub fn lock_row(row: &SharedRow) -> MutexGuard<'_, AsyncRowElement> {
    row.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RowPresenter for AsyncRowElement {
    /// Texts and geometry were settled at build time; only images remain.
    fn update(&mut self, item: &FeedItem, flags: UpdateFlags) {
        self.row.load_profile_image(item, flags);
        self.row.load_post_image(item, flags);
    }
}

impl Element for AsyncRowElement {
    fn core(&self) -> &ElementCore {
        self.row.core()
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        self.row.core_mut()
    }

    fn on_measure(&mut self, _width: MeasureSpec, _height: MeasureSpec) -> IntSize {
        self.row.measured_size()
    }

    fn on_draw(&self, canvas: &mut Canvas) {
        self.row.on_draw(canvas);
        let size = self.row.metrics().padding as f32;
        canvas.draw_rect(Rect::new(0.0, 0.0, size, size), self.origin.indicator_color());
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn Element)) {
        self.row.for_each_child(f);
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Element)) {
        self.row.for_each_child_mut(f);
    }
}

/// A list cell that shows rows from an [`AsyncRowFactory`].
pub struct AsyncRowView {
    view: ElementView,
    factory: Arc<AsyncRowFactory>,
    loader: Option<Arc<dyn ImageLoader>>,
    row: Option<SharedRow>,
}

impl AsyncRowView {
    pub fn new(surface: Arc<dyn Surface>, factory: Arc<AsyncRowFactory>) -> Self {
        Self {
            view: ElementView::new(surface),
            factory,
            loader: None,
            row: None,
        }
    }

    pub fn with_image_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn view(&self) -> &ElementView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ElementView {
        &mut self.view
    }

    /// The row currently shown.
    pub fn row(&self) -> Option<&SharedRow> {
        self.row.as_ref()
    }

    /// Poll image deliveries for the shown row. Returns whether any were
    /// applied.
    pub fn poll_images(&mut self) -> bool {
        match &self.row {
            Some(row) => lock_row(row).row_mut().poll_images() > 0,
            None => false,
        }
    }
}

impl RowPresenter for AsyncRowView {
    /// Show the factory's row for `item`, building it here on a miss, then
    /// start its image loads.
    fn update(&mut self, item: &FeedItem, flags: UpdateFlags) {
        let row = self.factory.create(item);
        let shared: SharedElement = row.clone();
        self.view.set_element(Some(shared));
        {
            let mut element = lock_row(&row);
            element.row_mut().set_image_loader(self.loader.clone());
            element.update(item, flags);
        }
        self.row = Some(row);
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeedConfig, RowMetrics};
    use crate::images::LoadedFrom;
    use crate::row::feed_resources;
    use crate::testing::{row_surface, StaticImageLoader};
    use lamina::DrawOp;

    fn factory() -> Arc<AsyncRowFactory> {
        let config = FeedConfig::default();
        let factory = AsyncRowFactory::new(&config, Arc::new(feed_resources(&config.metrics)));
        factory.set_target_width(300);
        Arc::new(factory)
    }

    fn item() -> FeedItem {
        FeedItem::new(1, "A", "hello", "p")
    }

    #[test]
    fn test_measure_keeps_built_size() {
        let factory = factory();
        let row = factory.create(&item());
        let mut element = lock_row(&row);
        let built = element.measured_size();
        assert_eq!(built.width, 300);

        element.measure(MeasureSpec::exactly(100), MeasureSpec::exactly(10));
        assert_eq!(element.measured_size(), built);
    }

    #[test]
    fn test_origin_indicator_drawn_last() {
        let factory = factory();
        let row = factory.create(&item());
        let element = lock_row(&row);
        assert_eq!(element.origin(), BuildOrigin::Primary);

        let mut canvas = Canvas::new();
        element.draw(&mut canvas);
        match canvas.ops().last() {
            Some(DrawOp::Rect { color, .. }) => {
                assert_eq!(*color, BuildOrigin::Primary.indicator_color());
            }
            other => panic!("expected indicator rect, got {other:?}"),
        }
        assert_eq!(canvas.ops().last().unwrap().rect(), Rect::new(0.0, 0.0, 8.0, 8.0));
    }

    #[test]
    fn test_view_reuses_cached_row_and_loads_images() {
        let factory = factory();
        let surface = row_surface(&RowMetrics::default());
        let loader = Arc::new(StaticImageLoader::new(LoadedFrom::Memory).with_image("p", 12, 12));
        let mut view = AsyncRowView::new(surface.clone(), factory.clone()).with_image_loader(loader.clone());
        view.view_mut().attach();

        let cached = factory.create(&item());
        view.update(&item(), UpdateFlags::NONE);
        assert!(Arc::ptr_eq(view.row().unwrap(), &cached));
        assert!(lock_row(&cached).is_attached());
        assert_eq!(loader.requests(), vec!["p".to_string()]);

        assert!(view.poll_images());
        assert_eq!(lock_row(&cached).row().profile_image().drawable_size(), (12, 12));
        assert!(!view.poll_images());
    }

    #[test]
    fn test_cached_row_keeps_text_on_surface() {
        let factory = factory();
        let cached = factory.create(&item());
        let surface = row_surface(&RowMetrics::default());
        let mut view = AsyncRowView::new(surface, factory.clone());
        view.view_mut().attach();
        view.update(&item(), UpdateFlags::NO_IMAGE_LOADING);
        assert!(Arc::ptr_eq(view.row().unwrap(), &cached));

        let element = lock_row(&cached);
        assert!(element.row().author_text().text_layout().is_some());
        assert!(element.row().message_text().text_layout().is_some());

        let mut canvas = Canvas::new();
        element.draw(&mut canvas);
        let texts: Vec<_> = canvas
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["A", "hello"]);
    }

    #[test]
    fn test_view_detaches_previous_row() {
        let factory = factory();
        let surface = row_surface(&RowMetrics::default());
        let mut view = AsyncRowView::new(surface, factory.clone());
        view.view_mut().attach();

        view.update(&item(), UpdateFlags::NO_IMAGE_LOADING);
        let first = view.row().unwrap().clone();
        view.update(&FeedItem::new(2, "B", "bye", "p2"), UpdateFlags::NO_IMAGE_LOADING);

        assert!(!lock_row(&first).is_attached());
        assert!(lock_row(view.row().unwrap()).is_attached());
    }
}
