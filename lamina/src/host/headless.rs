use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::Host;
use crate::drawable::{DrawableId, DrawableState, TaskId};
use crate::primitives::IntRect;
use crate::resources::Resources;

/// A host with no surface behind it.
///
/// Elements attached here can be measured and laid out on any thread. Every
/// request is dropped; only resources and the target width are real.
#[derive(Debug)]
pub struct HeadlessHost {
    resources: Arc<Resources>,
    target_width: AtomicI32,
}

impl HeadlessHost {
    pub fn new(resources: Arc<Resources>) -> Self {
        Self {
            resources,
            target_width: AtomicI32::new(0),
        }
    }

    /// Publish a new target width. Readers see it on their next load.
    pub fn set_target_width(&self, width: i32) {
        self.target_width.store(width.max(0), Ordering::SeqCst);
    }

    pub fn current_target_width(&self) -> i32 {
        self.target_width.load(Ordering::SeqCst)
    }

    pub fn resources_arc(&self) -> &Arc<Resources> {
        &self.resources
    }
}

impl Host for HeadlessHost {
    fn request_layout(&self) {}

    fn invalidate(&self) {}

    fn invalidate_rect(&self, _rect: IntRect) {}

    fn drawable_state(&self) -> DrawableState {
        DrawableState::EMPTY
    }

    fn resources(&self) -> &Resources {
        &self.resources
    }

    fn invalidate_drawable(&self, _who: DrawableId) {}

    fn schedule_drawable(&self, _who: DrawableId, _what: TaskId, _when: Instant) {}

    fn unschedule_drawable(&self, _who: DrawableId, _what: Option<TaskId>) {}

    fn target_width(&self) -> Option<i32> {
        Some(self.current_target_width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_width_is_published() {
        let host = HeadlessHost::new(Arc::new(Resources::default()));
        assert_eq!(host.target_width(), Some(0));
        host.set_target_width(320);
        assert_eq!(host.target_width(), Some(320));
        host.set_target_width(-4);
        assert_eq!(host.current_target_width(), 0);
    }
}
