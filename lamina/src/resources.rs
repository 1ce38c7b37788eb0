//! Resources a host hands to its elements: display density, the text
//! measurer and named drawables.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::drawable::Drawable;
use crate::error::ResourceError;
use crate::text::{MonospaceMeasurer, TextMeasurer};

/// Identifier of a registered drawable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u32);

type DrawableFactory = Arc<dyn Fn() -> Box<dyn Drawable> + Send + Sync>;

/// Drawable registry plus display metrics.
///
/// Drawables are single-owner, so the registry stores factories and every
/// lookup builds a fresh instance.
#[derive(Clone)]
pub struct Resources {
    density: f32,
    text_measurer: Arc<dyn TextMeasurer>,
    drawables: HashMap<ResourceId, DrawableFactory>,
    names: HashMap<String, ResourceId>,
}

impl Resources {
    pub fn new(text_measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            density: 1.0,
            text_measurer,
            drawables: HashMap::new(),
            names: HashMap::new(),
        }
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    /// Convert density-independent pixels to whole device pixels.
    pub fn dp(&self, value: f32) -> i32 {
        (value * self.density).round() as i32
    }

    pub fn text_measurer(&self) -> &Arc<dyn TextMeasurer> {
        &self.text_measurer
    }

    /// Register a drawable under `id` and, for layout descriptions, `name`.
    pub fn register_drawable<F>(&mut self, id: ResourceId, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Drawable> + Send + Sync + 'static,
    {
        self.drawables.insert(id, Arc::new(factory));
        self.names.insert(name.to_string(), id);
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.names.get(name).copied()
    }

    /// Build a new instance of the drawable registered under `id`.
    pub fn drawable(&self, id: ResourceId) -> Result<Box<dyn Drawable>, ResourceError> {
        self.drawables
            .get(&id)
            .map(|factory| factory())
            .ok_or(ResourceError::NotFound(id))
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new(Arc::new(MonospaceMeasurer))
    }
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resources")
            .field("density", &self.density)
            .field("text_measurer", &self.text_measurer)
            .field("drawables", &self.drawables.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::ColorDrawable;
    use crate::primitives::Color;

    #[test]
    fn test_registered_drawable_is_built_per_lookup() {
        let mut res = Resources::default();
        res.register_drawable(ResourceId(7), "placeholder", || {
            Box::new(ColorDrawable::new(Color::BLACK).with_size(4, 4))
        });

        let a = res.drawable(ResourceId(7)).unwrap();
        let b = res.drawable(ResourceId(7)).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.intrinsic_width(), 4);
        assert_eq!(res.resource_id("placeholder"), Some(ResourceId(7)));
    }

    #[test]
    fn test_missing_drawable_is_an_error() {
        let res = Resources::default();
        assert!(matches!(
            res.drawable(ResourceId(1)),
            Err(ResourceError::NotFound(ResourceId(1)))
        ));
    }

    #[test]
    fn test_dp_rounds() {
        let res = Resources::default().with_density(1.5);
        assert_eq!(res.dp(10.0), 15);
        assert_eq!(res.dp(3.0), 5);
    }
}
