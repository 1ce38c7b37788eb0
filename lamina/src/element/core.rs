//! Per-element bookkeeping shared by every element type.

use std::sync::{Arc, Weak};

use crate::host::Host;
use crate::measure::{LayoutParams, Padding};
use crate::primitives::{IntRect, IntSize};

/// Whether an element draws and takes up space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Visibility {
    /// Drawn and laid out.
    #[default]
    Visible,
    /// Laid out but not drawn.
    Invisible,
    /// Neither drawn nor given space by its parent.
    Gone,
}

/// State every element carries: identity, geometry, padding, visibility and
/// a non-owning reference to its host.
#[derive(Default)]
pub struct ElementCore {
    pub(crate) id: Option<u32>,
    pub(crate) layout_params: Option<LayoutParams>,
    pub(crate) measured: IntSize,
    pub(crate) bounds: IntRect,
    pub(crate) padding: Padding,
    pub(crate) visibility: Visibility,
    pub(crate) host: Option<Weak<dyn Host>>,
}

impl ElementCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// The host, if attached and still alive.
    pub fn host(&self) -> Option<Arc<dyn Host>> {
        self.host.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        self.host().is_some()
    }

    /// Whether the element is currently attached to exactly `host`.
    pub(crate) fn is_host(&self, host: Option<&Arc<dyn Host>>) -> bool {
        match (&self.host, host) {
            (None, None) => true,
            (Some(current), Some(host)) => {
                Weak::as_ptr(current) as *const () == Arc::as_ptr(host) as *const ()
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for ElementCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementCore")
            .field("id", &self.id)
            .field("layout_params", &self.layout_params)
            .field("measured", &self.measured)
            .field("bounds", &self.bounds)
            .field("padding", &self.padding)
            .field("visibility", &self.visibility)
            .field("attached", &self.host.is_some())
            .finish()
    }
}
