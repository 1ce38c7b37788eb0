use std::sync::Arc;
use std::time::Instant;

use super::Host;
use crate::canvas::Canvas;
use crate::drawable::{DrawableId, DrawableState, TaskId};
use crate::element::{lock, ElementExt, SharedElement};
use crate::measure::{MeasureSpec, Padding};
use crate::primitives::{IntRect, IntSize};
use crate::resources::Resources;

/// A real, interactive drawing surface: a window, a list row, a test double.
pub trait Surface: Send + Sync {
    fn request_layout(&self);
    fn invalidate(&self);
    fn invalidate_rect(&self, rect: IntRect);
    fn drawable_state(&self) -> DrawableState;
    fn resources(&self) -> &Resources;
    fn invalidate_drawable(&self, who: DrawableId);
    fn schedule_drawable(&self, who: DrawableId, what: TaskId, when: Instant);
    fn unschedule_drawable(&self, who: DrawableId, what: Option<TaskId>);
}

/// Adapts a [`Surface`] to the [`Host`] contract.
pub struct SurfaceHost {
    surface: Arc<dyn Surface>,
}

impl SurfaceHost {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }
}

impl Host for SurfaceHost {
    fn request_layout(&self) {
        self.surface.request_layout();
    }

    fn invalidate(&self) {
        self.surface.invalidate();
    }

    fn invalidate_rect(&self, rect: IntRect) {
        self.surface.invalidate_rect(rect);
    }

    fn drawable_state(&self) -> DrawableState {
        self.surface.drawable_state()
    }

    fn resources(&self) -> &Resources {
        self.surface.resources()
    }

    fn invalidate_drawable(&self, who: DrawableId) {
        self.surface.invalidate_drawable(who);
    }

    fn schedule_drawable(&self, who: DrawableId, what: TaskId, when: Instant) {
        self.surface.schedule_drawable(who, what, when);
    }

    fn unschedule_drawable(&self, who: DrawableId, what: Option<TaskId>) {
        self.surface.unschedule_drawable(who, what);
    }
}

/// Shows one root element on a surface.
///
/// The view attaches the root to its host while the view itself is attached,
/// and measures and lays the root out inside its own padding.
pub struct ElementView {
    host: Arc<dyn Host>,
    surface: Arc<dyn Surface>,
    element: Option<SharedElement>,
    padding: Padding,
    attached: bool,
    measured: IntSize,
}

impl ElementView {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self {
            host: Arc::new(SurfaceHost::new(surface.clone())),
            surface,
            element: None,
            padding: Padding::ZERO,
            attached: false,
            measured: IntSize::ZERO,
        }
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn element(&self) -> Option<&SharedElement> {
        self.element.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn set_padding(&mut self, padding: Padding) {
        if self.padding != padding {
            self.padding = padding;
            self.surface.request_layout();
        }
    }

    pub fn measured_size(&self) -> IntSize {
        self.measured
    }

    /// Replace the root. The old root is detached, the new one attached if
    /// the view is.
    pub fn set_element(&mut self, element: Option<SharedElement>) {
        let same = match (&self.element, &element) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }

        if let Some(old) = self.element.take() {
            lock(&old).swap_host(None);
        }
        self.element = element;
        if self.attached {
            if let Some(new) = &self.element {
                lock(new).swap_host(Some(&self.host));
            }
        }

        self.surface.request_layout();
        self.surface.invalidate();
    }

    /// The surface became visible.
    pub fn attach(&mut self) {
        self.attached = true;
        if let Some(element) = &self.element {
            lock(element).swap_host(Some(&self.host));
        }
    }

    /// The surface went away.
    pub fn detach(&mut self) {
        self.attached = false;
        if let Some(element) = &self.element {
            lock(element).swap_host(None);
        }
    }

    /// Measure the root inside the view padding and return the view size.
    pub fn measure(&mut self, width: MeasureSpec, height: MeasureSpec) -> IntSize {
        let p = self.padding;
        self.measured = match &self.element {
            Some(element) => {
                let mut element = lock(element);
                element.measure(
                    MeasureSpec::new(width.mode, (width.size - p.horizontal()).max(0)),
                    MeasureSpec::new(height.mode, (height.size - p.vertical()).max(0)),
                );
                IntSize::new(
                    element.measured_width() + p.horizontal(),
                    element.measured_height() + p.vertical(),
                )
            }
            None => IntSize::ZERO,
        };
        self.measured
    }

    /// Lay the root out in the content box of a view at the given bounds.
    pub fn layout(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        let p = self.padding;
        if let Some(element) = &self.element {
            lock(element).layout(p.left, p.top, right - left - p.right, bottom - top - p.bottom);
        }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let count = canvas.save();
        if let Some(element) = &self.element {
            lock(element).draw(canvas);
        }
        canvas.restore_to_count(count);
    }

    /// Forward a drawable state change to the root.
    pub fn drawable_state_changed(&mut self) {
        if let Some(element) = &self.element {
            lock(element).host_state_changed();
        }
    }
}
