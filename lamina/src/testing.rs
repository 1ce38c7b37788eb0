//! Test doubles.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::drawable::{DrawableId, DrawableState, TaskId};
use crate::host::{Host, Surface, SurfaceHost};
use crate::primitives::IntRect;
use crate::resources::Resources;

#[derive(Default)]
struct Recorded {
    layout_requests: usize,
    full_invalidations: usize,
    rects: Vec<IntRect>,
    drawables: Vec<DrawableId>,
    scheduled: Vec<(DrawableId, TaskId)>,
    unscheduled: Vec<(DrawableId, Option<TaskId>)>,
    drawable_state: DrawableState,
}

/// A surface that records every request it receives.
pub struct RecordingSurface {
    resources: Resources,
    recorded: Mutex<Recorded>,
}

impl RecordingSurface {
    pub fn new() -> Arc<Self> {
        Self::with_resources(Resources::default())
    }

    pub fn with_resources(resources: Resources) -> Arc<Self> {
        Arc::new(Self {
            resources,
            recorded: Mutex::new(Recorded::default()),
        })
    }

    /// A fresh host over this surface. Elements attached to it detach once
    /// the returned `Arc` is dropped.
    pub fn host(self: &Arc<Self>) -> Arc<dyn Host> {
        Arc::new(SurfaceHost::new(self.clone()))
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn layout_requests(&self) -> usize {
        self.recorded().layout_requests
    }

    /// Whole-surface invalidations.
    pub fn full_invalidations(&self) -> usize {
        self.recorded().full_invalidations
    }

    pub fn invalidated_rects(&self) -> Vec<IntRect> {
        self.recorded().rects.clone()
    }

    pub fn invalidated_drawables(&self) -> Vec<DrawableId> {
        self.recorded().drawables.clone()
    }

    pub fn scheduled(&self) -> Vec<(DrawableId, TaskId)> {
        self.recorded().scheduled.clone()
    }

    pub fn unscheduled(&self) -> Vec<(DrawableId, Option<TaskId>)> {
        self.recorded().unscheduled.clone()
    }

    pub fn set_drawable_state(&self, state: DrawableState) {
        self.recorded().drawable_state = state;
    }

    /// Forget everything recorded so far, keeping the drawable state.
    pub fn reset(&self) {
        let mut recorded = self.recorded();
        let state = recorded.drawable_state;
        *recorded = Recorded {
            drawable_state: state,
            ..Recorded::default()
        };
    }
}

impl Surface for RecordingSurface {
    fn request_layout(&self) {
        self.recorded().layout_requests += 1;
    }

    fn invalidate(&self) {
        self.recorded().full_invalidations += 1;
    }

    fn invalidate_rect(&self, rect: IntRect) {
        self.recorded().rects.push(rect);
    }

    fn drawable_state(&self) -> DrawableState {
        self.recorded().drawable_state
    }

    fn resources(&self) -> &Resources {
        &self.resources
    }

    fn invalidate_drawable(&self, who: DrawableId) {
        self.recorded().drawables.push(who);
    }

    fn schedule_drawable(&self, who: DrawableId, what: TaskId, _when: Instant) {
        self.recorded().scheduled.push((who, what));
    }

    fn unschedule_drawable(&self, who: DrawableId, what: Option<TaskId>) {
        self.recorded().unscheduled.push((who, what));
    }
}

/// Route `tracing` output through the test harness once per process.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
