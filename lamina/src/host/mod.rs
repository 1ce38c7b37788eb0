//! Hosts - what elements talk to.
//!
//! A host receives relayout and invalidation requests from the elements
//! attached to it, supplies the drawable state and resources they render
//! with, and runs drawable animations on their behalf.

mod headless;
mod surface;

use std::time::Instant;

pub use headless::HeadlessHost;
pub use surface::{ElementView, Surface, SurfaceHost};

use crate::drawable::{DrawableId, DrawableState, TaskId};
use crate::primitives::IntRect;
use crate::resources::Resources;

/// Services an attached element may use.
pub trait Host: Send + Sync {
    fn request_layout(&self);

    /// Invalidate everything the host shows.
    fn invalidate(&self);

    /// Invalidate a region in the root element's coordinates.
    fn invalidate_rect(&self, rect: IntRect);

    fn drawable_state(&self) -> DrawableState;

    fn resources(&self) -> &Resources;

    fn invalidate_drawable(&self, who: DrawableId);

    fn schedule_drawable(&self, who: DrawableId, what: TaskId, when: Instant);

    /// `None` cancels every task scheduled for `who`.
    fn unschedule_drawable(&self, who: DrawableId, what: Option<TaskId>);

    /// Width rows are laid out at off-surface, if this host has one.
    fn target_width(&self) -> Option<i32> {
        None
    }
}
