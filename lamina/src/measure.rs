//! Measure specs and layout parameters.
//!
//! Constraints flow down the element tree as a pair of [`MeasureSpec`]s, one
//! per axis. A group turns its own spec plus a child's desired
//! [`Dimension`] into the spec it hands that child with
//! [`child_measure_spec`].

use serde::Deserialize;

/// How a parent constrains one axis of a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureMode {
    /// The parent imposes no limit; the child reports what it wants.
    Unspecified,
    /// The child must be exactly `size`.
    Exactly,
    /// The child may be as large as it wants up to `size`.
    AtMost,
}

/// A (mode, size) pair for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeasureSpec {
    pub mode: MeasureMode,
    pub size: i32,
}

impl MeasureSpec {
    #[inline]
    pub const fn new(mode: MeasureMode, size: i32) -> Self {
        Self { mode, size }
    }

    #[inline]
    pub const fn exactly(size: i32) -> Self {
        Self::new(MeasureMode::Exactly, size)
    }

    #[inline]
    pub const fn at_most(size: i32) -> Self {
        Self::new(MeasureMode::AtMost, size)
    }

    #[inline]
    pub const fn unspecified() -> Self {
        Self::new(MeasureMode::Unspecified, 0)
    }

    /// Resolve a desired size against this spec.
    ///
    /// `Exactly` wins outright, `AtMost` clamps, `Unspecified` passes through.
    #[inline]
    pub fn resolve(&self, desired: i32) -> i32 {
        match self.mode {
            MeasureMode::Exactly => self.size,
            MeasureMode::AtMost => desired.min(self.size),
            MeasureMode::Unspecified => desired,
        }
    }
}

/// Desired size of a child along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    /// Fixed size in pixels.
    Fixed(i32),
    /// As large as the parent allows.
    MatchParent,
    /// Intrinsic content size.
    #[default]
    WrapContent,
}

/// Produce the spec for a child along one axis.
///
/// `used` is everything already consumed on that axis: the parent's padding,
/// the child's margins and any siblings measured before it.
pub fn child_measure_spec(parent: MeasureSpec, used: i32, child: Dimension) -> MeasureSpec {
    let available = (parent.size - used).max(0);

    match (parent.mode, child) {
        (_, Dimension::Fixed(size)) => MeasureSpec::exactly(size.max(0)),

        (MeasureMode::Exactly, Dimension::MatchParent) => MeasureSpec::exactly(available),
        (MeasureMode::Exactly, Dimension::WrapContent) => MeasureSpec::at_most(available),

        (MeasureMode::AtMost, Dimension::MatchParent | Dimension::WrapContent) => {
            MeasureSpec::at_most(available)
        }

        (MeasureMode::Unspecified, Dimension::MatchParent | Dimension::WrapContent) => {
            MeasureSpec::unspecified()
        }
    }
}

/// Padding around content, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Padding {
    pub const ZERO: Self = Self {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    /// Create padding with explicit values for each side.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Uniform padding on all sides.
    pub const fn all(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Total horizontal padding.
    pub fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    /// Total vertical padding.
    pub fn vertical(&self) -> i32 {
        self.top + self.bottom
    }
}

/// Margins share the four-sided shape of padding.
pub type Margins = Padding;

/// Layout parameters with margins, the only kind groups accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarginLayoutParams {
    pub width: Dimension,
    pub height: Dimension,
    pub margins: Margins,
}

impl MarginLayoutParams {
    pub fn new(width: Dimension, height: Dimension) -> Self {
        Self {
            width,
            height,
            margins: Margins::ZERO,
        }
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }
}

/// Layout parameters a child carries for its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutParams {
    /// Desired size only.
    Basic { width: Dimension, height: Dimension },
    /// Desired size plus margins.
    Margin(MarginLayoutParams),
}

impl LayoutParams {
    pub fn new(width: Dimension, height: Dimension) -> Self {
        LayoutParams::Basic { width, height }
    }

    pub fn width(&self) -> Dimension {
        match self {
            LayoutParams::Basic { width, .. } => *width,
            LayoutParams::Margin(lp) => lp.width,
        }
    }

    pub fn height(&self) -> Dimension {
        match self {
            LayoutParams::Basic { height, .. } => *height,
            LayoutParams::Margin(lp) => lp.height,
        }
    }

    /// Margins, zero for basic params.
    pub fn margins(&self) -> Margins {
        match self {
            LayoutParams::Basic { .. } => Margins::ZERO,
            LayoutParams::Margin(lp) => lp.margins,
        }
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        LayoutParams::new(Dimension::WrapContent, Dimension::WrapContent)
    }
}

impl From<MarginLayoutParams> for LayoutParams {
    fn from(lp: MarginLayoutParams) -> Self {
        LayoutParams::Margin(lp)
    }
}

// =========================================================================
// Tests
// =========================================================================
