//! Text measurement backends.
//!
//! Layouts only need two things from a font: how wide a run of text is and
//! the vertical metrics of a line. [`MonospaceMeasurer`] answers both from
//! character cell widths and needs no fonts, which keeps headless layout
//! deterministic. [`CosmicTextMeasurer`] shapes with cosmic-text.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use unicode_width::UnicodeWidthChar;

/// Vertical font metrics in pixels, all measured from the baseline and
/// positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Recommended distance above the baseline.
    pub ascent: f32,
    /// Recommended distance below the baseline.
    pub descent: f32,
    /// Extra room above `ascent` the tallest glyphs may need.
    pub top_padding: f32,
    /// Extra room below `descent` the deepest glyphs may need.
    pub bottom_padding: f32,
}

/// Measures text for a given font size.
pub trait TextMeasurer: Send + Sync + fmt::Debug {
    /// Advance width of `text` laid out on a single line.
    fn measure(&self, text: &str, font_size: f32) -> f32;

    fn metrics(&self, font_size: f32) -> FontMetrics;
}

// =========================================================================
// Monospace
// =========================================================================

/// Cell-based measurer: every column is `0.6 * font_size` wide, wide CJK
/// characters take two columns, combining marks none.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonospaceMeasurer;

impl MonospaceMeasurer {
    /// Display width of `text` in columns.
    pub fn columns(text: &str) -> usize {
        text.chars()
            .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
            .sum()
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        // Multiply before dividing so whole sizes give exact widths.
        Self::columns(text) as f32 * font_size * 3.0 / 5.0
    }

    fn metrics(&self, font_size: f32) -> FontMetrics {
        FontMetrics {
            ascent: font_size * 4.0 / 5.0,
            descent: font_size / 5.0,
            top_padding: font_size / 10.0,
            bottom_padding: font_size / 10.0,
        }
    }
}

// =========================================================================
// cosmic-text
// =========================================================================

/// Shaping measurer backed by a shared cosmic-text `FontSystem`.
pub struct CosmicTextMeasurer {
    font_system: Mutex<FontSystem>,
    family: Family<'static>,
}

impl CosmicTextMeasurer {
    /// Load system fonts. This is slow; build one and share it.
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    pub fn with_font_system(font_system: FontSystem) -> Self {
        Self {
            font_system: Mutex::new(font_system),
            family: Family::SansSerif,
        }
    }

    /// Whether any font faces were loaded.
    pub fn has_fonts(&self) -> bool {
        let font_system = self.font_system.lock().unwrap_or_else(PoisonError::into_inner);
        !font_system.db().is_empty()
    }

    fn shape<R>(&self, text: &str, font_size: f32, f: impl FnOnce(&Buffer) -> R) -> R {
        let mut font_system = self.font_system.lock().unwrap_or_else(PoisonError::into_inner);
        let metrics = Metrics::new(font_size, font_size * 1.2);
        let mut buffer = Buffer::new(&mut font_system, metrics);
        buffer.set_size(&mut font_system, None, None);
        let attrs = Attrs::new().family(self.family);
        buffer.set_text(&mut font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut font_system, false);
        f(&buffer)
    }
}

impl Default for CosmicTextMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CosmicTextMeasurer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmicTextMeasurer").finish_non_exhaustive()
    }
}

impl TextMeasurer for CosmicTextMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        self.shape(text, font_size, |buffer| {
            buffer
                .layout_runs()
                .map(|run| run.line_w)
                .fold(0.0_f32, f32::max)
        })
    }

    fn metrics(&self, font_size: f32) -> FontMetrics {
        let fallback = MonospaceMeasurer.metrics(font_size);
        self.shape("Mg", font_size, |buffer| {
            buffer
                .layout_runs()
                .next()
                .map(|run| {
                    // line_y is the baseline offset from the line top.
                    let ascent = run.line_y - run.line_top;
                    let descent = (run.line_height - ascent).max(0.0);
                    FontMetrics {
                        ascent,
                        descent,
                        top_padding: fallback.top_padding,
                        bottom_padding: fallback.bottom_padding,
                    }
                })
                .unwrap_or(fallback)
        })
    }
}

// =========================================================================
// Tests
// =========================================================================
