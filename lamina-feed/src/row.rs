//! The feed row: profile image, author, message, optional post image and a
//! strip of action icons, positioned with fixed pixel math.
//!
//! ```text
//! +---------+------------------------------+
//! | profile | author                       |
//! |         | message ...                  |
//! |         | [post image]                 |
//! |         | (r) (rp) (fav)               |
//! +---------+------------------------------+
//! ```

use std::sync::Arc;

use lamina::{
    Canvas, Color, ColorDrawable, Element, ElementCore, ElementExt, FixedGroup, ImageElement,
    ImageSlot, IntRect, IntSize, MeasureSpec, Padding, ResourceId, Resources, ScaleType,
    TextElement, TextSlot, Visibility,
};

use crate::config::RowMetrics;
use crate::images::{apply_delivery, image_request, ImageDelivery, ImageLoader, PendingImage};
use crate::item::{Action, FeedItem, RowPresenter, UpdateFlags};

pub const PLACEHOLDER: ResourceId = ResourceId(100);
pub const REPLY_ICON: ResourceId = ResourceId(101);
pub const REPOST_ICON: ResourceId = ResourceId(102);
pub const FAVOURITE_ICON: ResourceId = ResourceId(103);

const PLACEHOLDER_COLOR: u32 = 0xFFDD_DDDD;
const ICON_COLOR: u32 = 0xFF99_9999;

fn action_resource(action: Action) -> ResourceId {
    match action {
        Action::Reply => REPLY_ICON,
        Action::Repost => REPOST_ICON,
        Action::Favourite => FAVOURITE_ICON,
    }
}

/// Register the placeholder and action icons rows draw with.
pub fn register_row_drawables(resources: &mut Resources, metrics: &RowMetrics) {
    resources.register_drawable(PLACEHOLDER, "placeholder", || {
        Box::new(ColorDrawable::new(Color::from_argb(PLACEHOLDER_COLOR)))
    });
    let size = metrics.icon_size;
    for (action, name) in [
        (Action::Reply, "reply"),
        (Action::Repost, "repost"),
        (Action::Favourite, "favourite"),
    ] {
        resources.register_drawable(action_resource(action), name, move || {
            Box::new(ColorDrawable::new(Color::from_argb(ICON_COLOR)).with_size(size, size))
        });
    }
}

/// Default resources plus the row drawables.
pub fn feed_resources(metrics: &RowMetrics) -> Resources {
    let mut resources = Resources::default();
    register_row_drawables(&mut resources, metrics);
    resources
}

pub struct RowElement {
    group: FixedGroup,
    metrics: RowMetrics,
    profile: ImageSlot,
    author: TextSlot,
    message: TextSlot,
    post: ImageSlot,
    actions: [ImageSlot; 3],
    loader: Option<Arc<dyn ImageLoader>>,
    pending: Vec<(ImageSlot, PendingImage)>,
}

impl RowElement {
    pub fn new(metrics: RowMetrics) -> Self {
        let mut group = FixedGroup::new();

        let profile = group.add_image();
        group.image_mut(profile).set_scale_type(ScaleType::CenterCrop);

        let author = group.add_text();
        let text = group.text_mut(author);
        text.set_text_size(metrics.author_text_size);
        text.set_text_color(metrics.author_color());

        let message = group.add_text();
        let text = group.text_mut(message);
        text.set_text_size(metrics.message_text_size);
        text.set_text_color(metrics.message_color());

        let post = group.add_image();
        group.image_mut(post).set_scale_type(ScaleType::CenterCrop);

        let actions = Action::ALL.map(|action| {
            let slot = group.add_image();
            let icon = group.image_mut(slot);
            icon.set_scale_type(ScaleType::FitXy);
            icon.set_image_resource(action_resource(action));
            slot
        });

        let mut row = Self {
            group,
            metrics,
            profile,
            author,
            message,
            post,
            actions,
            loader: None,
            pending: Vec::new(),
        };
        row.set_padding(Padding::all(row.metrics.padding));
        row
    }

    pub fn metrics(&self) -> &RowMetrics {
        &self.metrics
    }

    pub fn profile_image(&self) -> &ImageElement {
        self.group.image(self.profile)
    }

    pub fn author_text(&self) -> &TextElement {
        self.group.text(self.author)
    }

    pub fn message_text(&self) -> &TextElement {
        self.group.text(self.message)
    }

    pub fn post_image(&self) -> &ImageElement {
        self.group.image(self.post)
    }

    pub fn action_icon(&self, action: Action) -> &ImageElement {
        self.group.image(self.actions[action.index()])
    }

    pub fn set_image_loader(&mut self, loader: Option<Arc<dyn ImageLoader>>) {
        self.loader = loader;
    }

    /// Fetches started but not yet applied.
    pub fn pending_images(&self) -> usize {
        self.pending.len()
    }

    pub fn load_profile_image(&mut self, item: &FeedItem, flags: UpdateFlags) {
        self.load_image(self.profile, &item.profile_image_url, flags);
    }

    pub fn load_post_image(&mut self, item: &FeedItem, flags: UpdateFlags) {
        if let Some(url) = item.post_image() {
            self.load_image(self.post, url, flags);
        }
    }

    /// Show the placeholder in `slot` and, unless suppressed, start a fetch
    /// that replaces whatever fetch the slot had in flight.
    fn load_image(&mut self, slot: ImageSlot, url: &str, flags: UpdateFlags) {
        self.pending.retain(|(s, _)| *s != slot);
        self.group.image_mut(slot).set_image_resource(PLACEHOLDER);
        if !flags.loads_images() {
            return;
        }
        let Some(loader) = self.loader.clone() else {
            return;
        };
        let (target, pending) = image_request(url);
        self.pending.push((slot, pending));
        loader.load(url, target);
    }

    /// Apply every delivery that has arrived. Returns how many were applied.
    pub fn poll_images(&mut self) -> usize {
        let host = self.core().host();
        let mut applied = 0;
        for (slot, mut pending) in std::mem::take(&mut self.pending) {
            let Some(delivery) = pending.try_take() else {
                self.pending.push((slot, pending));
                continue;
            };
            let image = self.group.image_mut(slot);
            match delivery {
                ImageDelivery::Failed => image.set_image_resource(PLACEHOLDER),
                loaded => {
                    let placeholder = host.as_ref().and_then(|h| h.resources().drawable(PLACEHOLDER).ok());
                    apply_delivery(image, loaded, placeholder);
                }
            }
            applied += 1;
        }
        applied
    }
}

fn place(element: &mut dyn Element, left: i32, top: i32) {
    let size = element.measured_size();
    element.layout(left, top, left + size.width, top + size.height);
}

impl RowPresenter for RowElement {
    fn update(&mut self, item: &FeedItem, flags: UpdateFlags) {
        self.group.text_mut(self.author).set_text(item.author_name.clone());
        self.group.text_mut(self.message).set_text(item.message.clone());
        self.load_profile_image(item, flags);

        let has_post = item.has_post_image();
        let visibility = if has_post { Visibility::Visible } else { Visibility::Gone };
        self.group.image_mut(self.post).set_visibility(visibility);
        if has_post {
            self.load_post_image(item, flags);
        }
    }
}

impl Element for RowElement {
    fn core(&self) -> &ElementCore {
        self.group.core()
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        self.group.core_mut()
    }

    /// The row always takes the full width it is offered and the height
    /// its content needs.
    fn on_measure(&mut self, width: MeasureSpec, _height: MeasureSpec) -> IntSize {
        let p = self.padding();
        let m = &self.metrics;
        let margin = m.content_margin;

        let profile = self.group.image_mut(self.profile);
        profile.measure(
            MeasureSpec::exactly(m.profile_image_size),
            MeasureSpec::exactly(m.profile_image_size),
        );
        let profile_size = profile.measured_size();

        let content_width = (width.size - profile_size.width - margin - p.horizontal()).max(0);

        let author = self.group.text_mut(self.author);
        author.measure(MeasureSpec::at_most(content_width), MeasureSpec::unspecified());
        let author_height = author.measured_height();

        let message = self.group.text_mut(self.message);
        message.measure(MeasureSpec::at_most(content_width), MeasureSpec::unspecified());
        let message_height = message.measured_height();

        let mut icon_height = 0;
        for slot in self.actions {
            let icon = self.group.image_mut(slot);
            icon.measure(MeasureSpec::exactly(m.icon_size), MeasureSpec::exactly(m.icon_size));
            icon_height = icon.measured_height();
        }

        let mut content_height = author_height + message_height + margin + icon_height;

        let post = self.group.image_mut(self.post);
        if post.visibility() != Visibility::Gone {
            post.measure(
                MeasureSpec::exactly(content_width),
                MeasureSpec::exactly(m.post_image_height),
            );
            content_height += margin + post.measured_height();
        }

        let height = content_height.max(profile_size.height) + p.vertical();
        IntSize::new(width.size, height)
    }

    fn on_layout(&mut self, _bounds: IntRect) {
        let p = self.padding();
        let margin = self.metrics.content_margin;
        let icon_margin = self.metrics.icon_margin;

        let profile = self.group.image_mut(self.profile);
        place(profile, p.left, p.top);
        let content_left = margin + p.left + profile.measured_width();

        let author = self.group.text_mut(self.author);
        place(author, content_left, p.top);
        let author_height = author.measured_height();

        let message = self.group.text_mut(self.message);
        place(message, content_left, p.top + author_height);
        let message_height = message.measured_height();

        let mut icon_top = margin + p.top + author_height + message_height;

        let post = self.group.image_mut(self.post);
        if post.visibility() != Visibility::Gone {
            place(post, content_left, p.top + author_height + message_height + margin);
            icon_top += post.measured_height() + margin;
        }

        let mut icon_left = content_left;
        for slot in self.actions {
            let icon = self.group.image_mut(slot);
            place(icon, icon_left, icon_top);
            icon_left += icon.measured_width() + icon_margin;
        }
    }

    fn on_draw(&self, canvas: &mut Canvas) {
        self.group.draw_children(canvas);
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn Element)) {
        self.group.for_each_child(f);
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Element)) {
        self.group.for_each_child_mut(f);
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::LoadedFrom;
    use crate::testing::{row_surface, StaticImageLoader};
    use lamina::Host;

    const WIDTH: i32 = 300;

    fn item() -> FeedItem {
        FeedItem::new(1, "A", "hello", "p")
    }

    fn attached_row(host: &Arc<dyn Host>) -> RowElement {
        let mut row = RowElement::new(RowMetrics::default());
        row.swap_host(Some(host));
        row
    }

    fn measure(row: &mut RowElement) -> IntSize {
        row.measure(MeasureSpec::exactly(WIDTH), MeasureSpec::unspecified());
        let size = row.measured_size();
        row.layout(0, 0, size.width, size.height);
        size
    }

    #[test]
    fn test_row_without_post_image() {
        let surface = row_surface(&RowMetrics::default());
        let host = surface.host();
        let mut row = attached_row(&host);
        row.update(&item(), UpdateFlags::NO_IMAGE_LOADING);

        let size = measure(&mut row);
        assert_eq!(size.width, WIDTH);
        assert_eq!(row.post_image().visibility(), Visibility::Gone);

        let content = row.author_text().measured_height() + row.message_text().measured_height() + 8 + 16;
        assert_eq!(size.height, content.max(48) + 16);
    }

    #[test]
    fn test_post_image_adds_height_and_margin() {
        let surface = row_surface(&RowMetrics::default());
        let host = surface.host();
        let mut row = attached_row(&host);

        row.update(&item(), UpdateFlags::NO_IMAGE_LOADING);
        let without = measure(&mut row).height;

        row.update(&item().with_post_image("q"), UpdateFlags::NO_IMAGE_LOADING);
        let with = measure(&mut row).height;

        assert_eq!(with - without, 160 + 8);
        assert_eq!(row.post_image().visibility(), Visibility::Visible);
        assert_eq!(row.post_image().measured_size(), IntSize::new(300 - 48 - 8 - 16, 160));
    }

    #[test]
    fn test_layout_positions() {
        let surface = row_surface(&RowMetrics::default());
        let host = surface.host();
        let mut row = attached_row(&host);
        row.update(&item().with_post_image("q"), UpdateFlags::NO_IMAGE_LOADING);
        measure(&mut row);

        assert_eq!(row.profile_image().bounds(), IntRect::new(8, 8, 56, 56));
        let author = row.author_text().bounds();
        assert_eq!((author.left, author.top), (64, 8));
        let message = row.message_text().bounds();
        assert_eq!((message.left, message.top), (64, author.bottom));

        let post = row.post_image().bounds();
        assert_eq!(post, IntRect::new(64, message.bottom + 8, 64 + 228, message.bottom + 8 + 160));

        let icon_top = post.bottom + 8;
        assert_eq!(row.action_icon(Action::Reply).bounds(), IntRect::new(64, icon_top, 80, icon_top + 16));
        assert_eq!(row.action_icon(Action::Repost).bounds().left, 64 + 28);
        assert_eq!(row.action_icon(Action::Favourite).bounds().left, 64 + 56);
    }

    #[test]
    fn test_suppressed_loading_shows_placeholders() {
        let surface = row_surface(&RowMetrics::default());
        let host = surface.host();
        let loader = Arc::new(StaticImageLoader::new(LoadedFrom::Network).with_image("p", 10, 10));
        let mut row = attached_row(&host);
        row.set_image_loader(Some(loader.clone()));

        row.update(&item(), UpdateFlags::NO_IMAGE_LOADING);
        assert!(loader.requests().is_empty());
        assert_eq!(row.pending_images(), 0);
        assert!(row.profile_image().drawable().is_some());
    }

    #[test]
    fn test_deliveries_applied_on_poll() {
        let surface = row_surface(&RowMetrics::default());
        let host = surface.host();
        let loader = Arc::new(
            StaticImageLoader::new(LoadedFrom::Memory)
                .with_image("p", 10, 10)
                .with_image("q", 40, 20),
        );
        let mut row = attached_row(&host);
        row.set_image_loader(Some(loader.clone()));

        row.update(&item().with_post_image("q"), UpdateFlags::NONE);
        assert_eq!(loader.requests(), vec!["p".to_string(), "q".to_string()]);
        assert_eq!(row.pending_images(), 2);
        assert_eq!(row.profile_image().drawable_size(), (-1, -1));

        assert_eq!(row.poll_images(), 2);
        assert_eq!(row.pending_images(), 0);
        assert_eq!(row.profile_image().drawable_size(), (10, 10));
        assert_eq!(row.post_image().drawable_size(), (40, 20));
    }

    #[test]
    fn test_failed_fetch_keeps_placeholder() {
        let surface = row_surface(&RowMetrics::default());
        let host = surface.host();
        let loader = Arc::new(StaticImageLoader::new(LoadedFrom::Network));
        let mut row = attached_row(&host);
        row.set_image_loader(Some(loader));

        row.update(&item(), UpdateFlags::NONE);
        assert_eq!(row.poll_images(), 1);
        assert!(row.profile_image().drawable().is_some());
        assert_eq!(row.profile_image().drawable_size(), (-1, -1));
    }

    #[test]
    fn test_rebinding_replaces_pending_fetch() {
        let loader = Arc::new(StaticImageLoader::new(LoadedFrom::Memory).with_image("p", 10, 10));
        let mut row = RowElement::new(RowMetrics::default());
        row.set_image_loader(Some(loader));

        row.update(&item(), UpdateFlags::NONE);
        row.update(&item(), UpdateFlags::NONE);
        assert_eq!(row.pending_images(), 1);
    }
}
