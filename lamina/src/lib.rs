//! Lamina: Retained-Mode Row Scene Graph
//!
//! Lamina draws composite content (images, wrapped text, icons) through a
//! small tree of elements that is far cheaper than a widget hierarchy:
//! - Measure/layout/draw protocol with parent-to-child measure specs
//! - Fixed-composition and constraint-propagating groups
//! - Image leaves with scale types and drawable callbacks
//! - Text leaves with single-line layout reuse
//!
//! # Architecture
//!
//! Every element talks to a [`Host`]. A [`SurfaceHost`] forwards requests to a
//! real drawing surface; a [`HeadlessHost`] drops them, so a tree can be
//! measured and laid out on a worker thread before any surface exists.
//! Drawing records primitives into a [`Canvas`].
//!
//! # Usage
//!
//! ```ignore
//! use lamina::{inflate, ElementExt, MeasureSpec, Resources};
//!
//! let mut row = inflate(LAYOUT_JSON, &Resources::default())?;
//! row.measure(MeasureSpec::exactly(320), MeasureSpec::unspecified());
//! row.layout(0, 0, 320, row.measured_height());
//! ```

// Core primitives
pub mod primitives;
pub mod canvas;
pub mod measure;
pub mod error;

// Assets
pub mod drawable;
pub mod resources;
pub mod text;

// Element tree
pub mod element;
pub mod host;
pub mod inflate;

// Test doubles
pub mod testing;

// Re-export core types
pub use canvas::{BitmapId, Canvas, DrawOp};
pub use drawable::{
    Bitmap, BitmapDrawable, ColorDrawable, ColorStateList, Drawable, DrawableCallback, DrawableId,
    DrawableState, FadeDrawable, LevelListDrawable, StateListDrawable, TaskId,
};
pub use element::fixed_group::{ElementKind, FixedGroup, ImageSlot, Leaf, TextSlot};
pub use element::image::{ImageElement, ScaleType};
pub use element::layout_group::{LayoutGroup, LinearGroup, Orientation};
pub use element::text::TextElement;
pub use element::{lock, Element, ElementCore, ElementExt, SharedElement, Visibility};
pub use error::{ElementError, ImageError, ResourceError};
pub use host::{ElementView, HeadlessHost, Host, Surface, SurfaceHost};
pub use inflate::inflate;
pub use measure::{
    child_measure_spec, Dimension, LayoutParams, MarginLayoutParams, Margins, MeasureMode,
    MeasureSpec, Padding,
};
pub use primitives::{Color, IntRect, IntSize, Matrix, Point, Rect};
pub use resources::{ResourceId, Resources};
pub use text::{Alignment, LineSpacing, TextPaint, TruncateAt};
