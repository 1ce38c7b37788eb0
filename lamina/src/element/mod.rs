//! Element System
//!
//! An element is a retained node that can be measured, laid out and drawn
//! without being a full widget. Elements implement the [`Element`] hooks;
//! the protocol around those hooks lives in [`ElementExt`], implemented once
//! for every element, so the wrappers cannot be overridden.
//!
//! # Protocol
//!
//! 1. **Measure** (`measure`): the parent passes one [`MeasureSpec`] per axis
//!    and the element records a non-negative measured size.
//! 2. **Layout** (`layout`): the parent assigns bounds in its own coordinate
//!    space. Layout never re-measures.
//! 3. **Draw** (`draw`): the canvas is clipped to the bounds and translated
//!    to their top-left corner before `on_draw` runs.
//!
//! # Hosts
//!
//! An element may be attached to a [`Host`] that receives relayout and
//! invalidation requests. The reference is weak; swapping hosts, including
//! to none, cascades through groups. While detached every request is
//! silently dropped.

mod core;
pub mod fixed_group;
pub mod image;
pub mod layout_group;
pub mod text;

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use self::core::{ElementCore, Visibility};

use crate::canvas::Canvas;
use crate::host::Host;
use crate::measure::{LayoutParams, MeasureSpec, Padding};
use crate::primitives::{IntRect, IntSize, Rect};

/// An element shared between owners, such as a cache and a view.
pub type SharedElement = Arc<Mutex<dyn Element>>;

/// Lock a shared element, recovering from a poisoned lock.
pub fn lock(element: &SharedElement) -> MutexGuard<'_, dyn Element> {
    element.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Upcast to `Any` for downcasting trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Hooks an element type implements.
///
/// Callers never invoke these directly; they go through [`ElementExt`].
pub trait Element: Send + AsAny + 'static {
    fn core(&self) -> &ElementCore;
    fn core_mut(&mut self) -> &mut ElementCore;

    /// Compute the desired size for the given constraints.
    fn on_measure(&mut self, width: MeasureSpec, height: MeasureSpec) -> IntSize;

    /// Position children. Bounds are already recorded.
    fn on_layout(&mut self, _bounds: IntRect) {}

    /// Draw in local coordinates; the origin is the top-left of the bounds.
    fn on_draw(&self, canvas: &mut Canvas);

    /// Called after a host has been set.
    fn on_attached(&mut self) {}

    /// Called while the old host is still set, just before it is cleared.
    fn on_detached(&mut self) {}

    /// The host's drawable state changed.
    fn on_host_state_changed(&mut self) {}

    fn on_visibility_changed(&mut self, _visibility: Visibility) {}

    fn on_padding_changed(&mut self) {}

    fn for_each_child(&self, _f: &mut dyn FnMut(&dyn Element)) {}

    fn for_each_child_mut(&mut self, _f: &mut dyn FnMut(&mut dyn Element)) {}
}

impl dyn Element {
    pub fn downcast_ref<T: Element>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Element>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

/// The element protocol, implemented for every [`Element`].
pub trait ElementExt: Element {
    /// Measure and record a non-negative size.
    fn measure(&mut self, width: MeasureSpec, height: MeasureSpec) {
        let size = self.on_measure(width, height);
        self.core_mut().measured = IntSize::new(size.width.max(0), size.height.max(0));
    }

    /// Record bounds, then let the element place its children.
    fn layout(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        let bounds = IntRect::new(left, top, right, bottom);
        self.core_mut().bounds = bounds;
        self.on_layout(bounds);
    }

    /// Clip to bounds, move the origin to their top-left, draw.
    fn draw(&self, canvas: &mut Canvas) {
        let bounds = self.core().bounds;
        let count = canvas.save();
        canvas.clip_rect(Rect::from(bounds));
        canvas.translate(bounds.left as f32, bounds.top as f32);
        self.on_draw(canvas);
        canvas.restore_to_count(count);
    }

    /// Attach to `host`, or detach with `None`. Returns `false` if the host
    /// is unchanged. Children follow either way.
    fn swap_host(&mut self, host: Option<&Arc<dyn Host>>) -> bool {
        let changed = !self.core().is_host(host);
        if changed {
            if self.core().host.is_some() {
                self.on_detached();
            }
            self.core_mut().host = host.map(Arc::downgrade);
            if host.is_some() {
                self.on_attached();
            }
        }
        self.for_each_child_mut(&mut |child| {
            child.swap_host(host);
        });
        changed
    }

    fn is_attached(&self) -> bool {
        self.core().is_attached()
    }

    fn request_layout(&self) {
        if let Some(host) = self.core().host() {
            host.request_layout();
        }
    }

    /// Invalidate this element's bounds.
    fn invalidate(&self) {
        if let Some(host) = self.core().host() {
            host.invalidate_rect(self.core().bounds);
        }
    }

    /// Propagate a drawable state change through the subtree.
    fn host_state_changed(&mut self) {
        self.on_host_state_changed();
        self.for_each_child_mut(&mut |child| child.host_state_changed());
    }

    fn id(&self) -> Option<u32> {
        self.core().id
    }

    fn set_id(&mut self, id: Option<u32>) {
        self.core_mut().id = id;
    }

    fn layout_params(&self) -> Option<LayoutParams> {
        self.core().layout_params
    }

    fn set_layout_params(&mut self, params: LayoutParams) {
        self.core_mut().layout_params = Some(params);
    }

    fn measured_size(&self) -> IntSize {
        self.core().measured
    }

    fn measured_width(&self) -> i32 {
        self.core().measured.width
    }

    fn measured_height(&self) -> i32 {
        self.core().measured.height
    }

    fn bounds(&self) -> IntRect {
        self.core().bounds
    }

    fn width(&self) -> i32 {
        self.core().bounds.width()
    }

    fn height(&self) -> i32 {
        self.core().bounds.height()
    }

    fn padding(&self) -> Padding {
        self.core().padding
    }

    fn set_padding(&mut self, padding: Padding) {
        if self.core().padding == padding {
            return;
        }
        self.core_mut().padding = padding;
        self.on_padding_changed();
        self.request_layout();
    }

    fn visibility(&self) -> Visibility {
        self.core().visibility
    }

    fn set_visibility(&mut self, visibility: Visibility) {
        if self.core().visibility == visibility {
            return;
        }
        self.core_mut().visibility = visibility;
        self.on_visibility_changed(visibility);
        self.request_layout();
        self.invalidate();
    }
}

impl<T: Element + ?Sized> ElementExt for T {}

/// Draw the visible children of a group inside one save/restore pair.
pub(crate) fn draw_children(element: &dyn Element, canvas: &mut Canvas) {
    let count = canvas.save();
    element.for_each_child(&mut |child| {
        if child.visibility() == Visibility::Visible {
            child.draw(canvas);
        }
    });
    canvas.restore_to_count(count);
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawOp;
    use crate::primitives::Color;
    use crate::testing::RecordingSurface;

    /// Fills its bounds and oversteps them by 10px on every side.
    #[derive(Default)]
    struct Overdraw {
        core: ElementCore,
        attached: usize,
        detached: usize,
    }

    impl Element for Overdraw {
        fn core(&self) -> &ElementCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ElementCore {
            &mut self.core
        }

        fn on_measure(&mut self, width: MeasureSpec, height: MeasureSpec) -> IntSize {
            IntSize::new(width.resolve(-5), height.resolve(20))
        }

        fn on_draw(&self, canvas: &mut Canvas) {
            let w = self.width() as f32;
            let h = self.height() as f32;
            canvas.draw_rect(Rect::new(-10.0, -10.0, w + 20.0, h + 20.0), Color::BLACK);
        }

        fn on_attached(&mut self) {
            self.attached += 1;
        }

        fn on_detached(&mut self) {
            self.detached += 1;
        }
    }

    #[test]
    fn test_measure_clamps_negative_sizes() {
        let mut el = Overdraw::default();
        el.measure(MeasureSpec::unspecified(), MeasureSpec::at_most(10));
        assert_eq!(el.measured_size(), IntSize::new(0, 10));
    }

    #[test]
    fn test_draw_clips_to_bounds() {
        let mut el = Overdraw::default();
        el.layout(30, 40, 80, 60);

        let mut canvas = Canvas::new();
        el.draw(&mut canvas);

        assert_eq!(canvas.save_count(), 0);
        let op = &canvas.ops()[0];
        assert!(matches!(op, DrawOp::Rect { .. }));
        assert_eq!(op.rect(), Rect::new(20.0, 30.0, 70.0, 40.0));
        assert_eq!(op.visible_rect(), Some(Rect::new(30.0, 40.0, 50.0, 20.0)));
    }

    #[test]
    fn test_swap_host_is_idempotent() {
        let surface = RecordingSurface::new();
        let host = surface.host();
        let mut el = Overdraw::default();

        assert!(el.swap_host(Some(&host)));
        assert!(!el.swap_host(Some(&host)));
        assert_eq!(el.attached, 1);
        assert_eq!(el.detached, 0);

        assert!(el.swap_host(None));
        assert!(!el.swap_host(None));
        assert_eq!(el.detached, 1);
    }

    #[test]
    fn test_requests_dropped_while_detached() {
        let surface = RecordingSurface::new();
        let host = surface.host();
        let mut el = Overdraw::default();

        el.set_visibility(Visibility::Invisible);
        assert_eq!(surface.layout_requests(), 0);

        el.swap_host(Some(&host));
        el.set_visibility(Visibility::Visible);
        assert_eq!(surface.layout_requests(), 1);
        assert_eq!(surface.invalidated_rects().len(), 1);
    }

    #[test]
    fn test_set_padding_requests_layout_once() {
        let surface = RecordingSurface::new();
        let host = surface.host();
        let mut el = Overdraw::default();
        el.swap_host(Some(&host));

        el.set_padding(Padding::all(4));
        el.set_padding(Padding::all(4));
        assert_eq!(surface.layout_requests(), 1);
        assert_eq!(el.padding(), Padding::all(4));
    }

    #[test]
    fn test_dropped_host_reads_as_detached() {
        let surface = RecordingSurface::new();
        let mut el = Overdraw::default();
        {
            let host = surface.host();
            el.swap_host(Some(&host));
            assert!(el.is_attached());
        }
        assert!(!el.is_attached());
    }
}
