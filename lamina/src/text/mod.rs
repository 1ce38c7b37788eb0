//! Text engine: paint, measurers and line layouts.
//!
//! Two layout kinds exist. A [`BoringLayout`] holds exactly one line of
//! left-to-right text without hard breaks and is cheap to rebuild in place.
//! A [`StaticLayout`] wraps arbitrary text into lines, optionally capped at a
//! maximum line count with an ellipsis on the last line.

mod layout;
mod measurer;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use layout::{
    ellipsize, is_boring, BoringLayout, BoringMetrics, LayoutId, LayoutInput, StaticLayout,
    TextLayout, ELLIPSIS,
};
pub use measurer::{CosmicTextMeasurer, FontMetrics, MonospaceMeasurer, TextMeasurer};

use crate::error::ElementError;

/// Font size and measurement backend used to lay out text.
#[derive(Clone)]
pub struct TextPaint {
    pub font_size: f32,
    pub antialias: bool,
    measurer: Arc<dyn TextMeasurer>,
}

impl TextPaint {
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            font_size: 14.0,
            antialias: true,
            measurer,
        }
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn measurer(&self) -> &Arc<dyn TextMeasurer> {
        &self.measurer
    }

    pub fn set_measurer(&mut self, measurer: Arc<dyn TextMeasurer>) {
        self.measurer = measurer;
    }

    /// Single-line advance width of `text`.
    pub fn measure(&self, text: &str) -> f32 {
        self.measurer.measure(text, self.font_size)
    }

    pub fn metrics(&self) -> FontMetrics {
        self.measurer.metrics(self.font_size)
    }
}

impl Default for TextPaint {
    fn default() -> Self {
        Self::new(Arc::new(MonospaceMeasurer))
    }
}

impl fmt::Debug for TextPaint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPaint")
            .field("font_size", &self.font_size)
            .field("antialias", &self.antialias)
            .field("measurer", &self.measurer)
            .finish()
    }
}

/// Horizontal placement of each line inside the layout width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Alignment {
    #[default]
    Normal,
    Opposite,
    Center,
}

/// Where an ellipsis replaces text that does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruncateAt {
    Start,
    Middle,
    End,
}

impl FromStr for TruncateAt {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(TruncateAt::Start),
            "middle" => Ok(TruncateAt::Middle),
            "end" => Ok(TruncateAt::End),
            other => Err(ElementError::UnknownEllipsis(other.to_string())),
        }
    }
}

/// Line height is `(ascent + descent) * multiplier + extra`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSpacing {
    pub multiplier: f32,
    pub extra: f32,
}

impl Default for LineSpacing {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            extra: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_at_from_str() {
        assert_eq!("end".parse::<TruncateAt>().unwrap(), TruncateAt::End);
        assert_eq!("start".parse::<TruncateAt>().unwrap(), TruncateAt::Start);
        assert!(matches!(
            "marquee".parse::<TruncateAt>(),
            Err(ElementError::UnknownEllipsis(s)) if s == "marquee"
        ));
    }
}
