//! Boring and static line layouts.

use std::sync::atomic::{AtomicU64, Ordering};

use super::{Alignment, LineSpacing, TextPaint, TruncateAt};
use crate::canvas::Canvas;
use crate::primitives::{Color, Point};

/// The ellipsis glyph.
pub const ELLIPSIS: &str = "\u{2026}";

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a layout object. Rebuilding a boring layout in place keeps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutId(u64);

impl LayoutId {
    fn next() -> Self {
        LayoutId(NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Metrics of text that fits a single boring line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoringMetrics {
    /// Advance width, rounded up to whole pixels.
    pub width: i32,
    pub ascent: f32,
    pub descent: f32,
    pub top_padding: f32,
    pub bottom_padding: f32,
}

fn is_rtl(c: char) -> bool {
    matches!(c,
        '\u{0590}'..='\u{08FF}'
        | '\u{FB1D}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}'
        | '\u{200F}' | '\u{202B}' | '\u{202E}')
}

/// Probe whether `text` can use the single-line fast path: no hard line
/// breaks and no right-to-left characters.
pub fn is_boring(text: &str, paint: &TextPaint) -> Option<BoringMetrics> {
    if text.chars().any(|c| c == '\n' || is_rtl(c)) {
        return None;
    }
    let metrics = paint.metrics();
    Some(BoringMetrics {
        width: paint.measure(text).ceil() as i32,
        ascent: metrics.ascent,
        descent: metrics.descent,
        top_padding: metrics.top_padding,
        bottom_padding: metrics.bottom_padding,
    })
}

/// Shorten `text` with an ellipsis so it fits in `available` pixels.
pub fn ellipsize(text: &str, paint: &TextPaint, available: f32, mode: TruncateAt) -> String {
    if paint.measure(text) <= available {
        return text.to_string();
    }
    let room = available - paint.measure(ELLIPSIS);
    if room < 0.0 {
        return String::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let prefix = |room: f32| -> usize {
        let mut taken = 0;
        let mut s = String::new();
        for c in &chars {
            s.push(*c);
            if paint.measure(&s) > room {
                break;
            }
            taken += 1;
        }
        taken
    };
    let suffix = |room: f32, limit: usize| -> usize {
        let mut taken = 0;
        let mut s = String::new();
        for c in chars.iter().rev().take(limit) {
            s.insert(0, *c);
            if paint.measure(&s) > room {
                break;
            }
            taken += 1;
        }
        taken
    };

    match mode {
        TruncateAt::End => {
            let head: String = chars[..prefix(room)].iter().collect();
            format!("{}{ELLIPSIS}", head.trim_end())
        }
        TruncateAt::Start => {
            let n = suffix(room, chars.len());
            let tail: String = chars[chars.len() - n..].iter().collect();
            format!("{ELLIPSIS}{}", tail.trim_start())
        }
        TruncateAt::Middle => {
            let h = prefix(room / 2.0);
            let head: String = chars[..h].iter().collect();
            let t = suffix(room - paint.measure(&head), chars.len() - h);
            let tail: String = chars[chars.len() - t..].iter().collect();
            format!("{head}{ELLIPSIS}{tail}")
        }
    }
}

/// Common inputs for building a layout.
#[derive(Debug, Clone, Copy)]
pub struct LayoutInput<'a> {
    pub text: &'a str,
    pub paint: &'a TextPaint,
    /// Outer width lines are aligned within.
    pub width: i32,
    pub alignment: Alignment,
    pub spacing: LineSpacing,
    pub include_pad: bool,
}

#[derive(Debug, Clone)]
struct Line {
    text: String,
    width: f32,
    hard_break: bool,
}

impl Line {
    fn new(text: &str, paint: &TextPaint, hard_break: bool) -> Self {
        let text = text.trim_end_matches(' ');
        Self {
            width: paint.measure(text),
            text: text.to_string(),
            hard_break,
        }
    }
}

/// Vertical geometry shared by every line of a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LineMetrics {
    ascent: f32,
    line_height: i32,
    top_pad: i32,
    bottom_pad: i32,
}

impl LineMetrics {
    fn new(ascent: f32, descent: f32, top: f32, bottom: f32, spacing: LineSpacing, include_pad: bool) -> Self {
        let natural = ascent + descent;
        let (top_pad, bottom_pad) = if include_pad {
            (top.ceil() as i32, bottom.ceil() as i32)
        } else {
            (0, 0)
        };
        Self {
            ascent,
            line_height: (natural * spacing.multiplier + spacing.extra).round().max(0.0) as i32,
            top_pad,
            bottom_pad,
        }
    }

    fn from_paint(paint: &TextPaint, spacing: LineSpacing, include_pad: bool) -> Self {
        let m = paint.metrics();
        Self::new(m.ascent, m.descent, m.top_padding, m.bottom_padding, spacing, include_pad)
    }

    fn line_top(&self, line: usize, line_count: usize) -> i32 {
        if line == 0 {
            0
        } else if line >= line_count {
            self.top_pad + line_count as i32 * self.line_height + self.bottom_pad
        } else {
            self.top_pad + line as i32 * self.line_height
        }
    }

    fn baseline(&self, line: usize) -> f32 {
        (self.top_pad + line as i32 * self.line_height) as f32 + self.ascent
    }
}

fn line_left(alignment: Alignment, width: i32, line_width: f32) -> f32 {
    match alignment {
        Alignment::Normal => 0.0,
        Alignment::Opposite => width as f32 - line_width,
        Alignment::Center => (width as f32 - line_width) / 2.0,
    }
}

fn draw_lines(
    canvas: &mut Canvas,
    lines: &[Line],
    metrics: &LineMetrics,
    alignment: Alignment,
    width: i32,
    font_size: f32,
    color: Color,
) {
    for (i, line) in lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }
        let top = metrics.line_top(i, lines.len()) as f32;
        let height = (metrics.line_top(i + 1, lines.len()) as f32 - top).max(0.0);
        canvas.draw_text(
            line.text.clone(),
            Point::new(line_left(alignment, width, line.width), top),
            line.width,
            height,
            metrics.baseline(i) - top,
            font_size,
            color,
        );
    }
}

// =========================================================================
// BoringLayout
// =========================================================================

/// A single line of boring text.
#[derive(Debug, Clone)]
pub struct BoringLayout {
    id: LayoutId,
    line: Line,
    width: i32,
    ellipsized_width: i32,
    ellipsis: Option<TruncateAt>,
    alignment: Alignment,
    metrics: LineMetrics,
    font_size: f32,
}

impl BoringLayout {
    /// Build a fresh layout. `ellipsis` carries the mode and the width the
    /// text must fit in.
    pub fn make(input: LayoutInput<'_>, boring: &BoringMetrics, ellipsis: Option<(TruncateAt, i32)>) -> Self {
        let mut layout = Self {
            id: LayoutId::next(),
            line: Line {
                text: String::new(),
                width: 0.0,
                hard_break: false,
            },
            width: 0,
            ellipsized_width: 0,
            ellipsis: None,
            alignment: input.alignment,
            metrics: LineMetrics::from_paint(input.paint, input.spacing, input.include_pad),
            font_size: input.paint.font_size,
        };
        layout.replace(input, boring, ellipsis);
        layout
    }

    /// Rebuild `reuse` in place when present, otherwise make a new layout.
    pub fn replace_or_make(
        reuse: Option<BoringLayout>,
        input: LayoutInput<'_>,
        boring: &BoringMetrics,
        ellipsis: Option<(TruncateAt, i32)>,
    ) -> Self {
        match reuse {
            Some(mut layout) => {
                layout.replace(input, boring, ellipsis);
                layout
            }
            None => Self::make(input, boring, ellipsis),
        }
    }

    fn replace(&mut self, input: LayoutInput<'_>, boring: &BoringMetrics, ellipsis: Option<(TruncateAt, i32)>) {
        let text = match ellipsis {
            Some((mode, avail)) if boring.width > avail => ellipsize(input.text, input.paint, avail as f32, mode),
            _ => input.text.to_string(),
        };
        self.line = Line {
            width: if text == input.text {
                boring.width as f32
            } else {
                input.paint.measure(&text)
            },
            text,
            hard_break: false,
        };
        self.width = input.width;
        self.ellipsized_width = ellipsis.map_or(input.width, |(_, avail)| avail);
        self.ellipsis = ellipsis.map(|(mode, _)| mode);
        self.alignment = input.alignment;
        self.metrics = LineMetrics::new(
            boring.ascent,
            boring.descent,
            boring.top_padding,
            boring.bottom_padding,
            input.spacing,
            input.include_pad,
        );
        self.font_size = input.paint.font_size;
    }

    pub fn id(&self) -> LayoutId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.line.text
    }
}

// =========================================================================
// StaticLayout
// =========================================================================

/// Multi-line text wrapped at word boundaries.
#[derive(Debug, Clone)]
pub struct StaticLayout {
    id: LayoutId,
    lines: Vec<Line>,
    width: i32,
    ellipsized_width: i32,
    alignment: Alignment,
    metrics: LineMetrics,
    font_size: f32,
}

impl StaticLayout {
    /// Wrap text at `input.width`. With `ellipsis`, lines past `max_lines`
    /// are folded into the last kept line and truncated.
    pub fn new(input: LayoutInput<'_>, ellipsis: Option<(TruncateAt, i32)>, max_lines: usize) -> Self {
        let mut lines = break_lines(input.text, input.paint, input.width as f32);

        if let Some((mode, avail)) = ellipsis {
            let keep = max_lines.max(1);
            if lines.len() > keep {
                let rest: Vec<String> = lines.drain(keep - 1..).map(|l| l.text).collect();
                let joined = rest.join(" ");
                let text = ellipsize(&joined, input.paint, avail as f32, mode);
                lines.push(Line::new(&text, input.paint, false));
            } else if let Some(last) = lines.last_mut() {
                if last.width > avail as f32 {
                    let text = ellipsize(&last.text, input.paint, avail as f32, mode);
                    *last = Line::new(&text, input.paint, last.hard_break);
                }
            }
        }

        Self {
            id: LayoutId::next(),
            lines,
            width: input.width,
            ellipsized_width: ellipsis.map_or(input.width, |(_, avail)| avail),
            alignment: input.alignment,
            metrics: LineMetrics::from_paint(input.paint, input.spacing, input.include_pad),
            font_size: input.paint.font_size,
        }
    }

    pub fn id(&self) -> LayoutId {
        self.id
    }

    pub fn line_text(&self, line: usize) -> &str {
        &self.lines[line].text
    }
}

fn longest_fitting_prefix(text: &str, paint: &TextPaint, width: f32) -> usize {
    let mut end = 0;
    for (idx, c) in text.char_indices() {
        let next = idx + c.len_utf8();
        if end > 0 && paint.measure(&text[..next]) > width {
            break;
        }
        end = next;
    }
    end
}

fn break_lines(text: &str, paint: &TextPaint, width: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let paragraphs: Vec<&str> = text.split('\n').collect();
    let last = paragraphs.len() - 1;

    for (i, paragraph) in paragraphs.iter().enumerate() {
        let mut current = String::new();
        for token in paragraph.split_inclusive(' ') {
            let candidate = format!("{current}{token}");
            if current.is_empty() || paint.measure(candidate.trim_end_matches(' ')) <= width {
                current = candidate;
            } else {
                lines.push(Line::new(&current, paint, false));
                current = token.to_string();
            }

            // A word wider than the line is split between characters.
            while paint.measure(current.trim_end_matches(' ')) > width {
                let split = longest_fitting_prefix(&current, paint, width);
                if split >= current.trim_end_matches(' ').len() {
                    break;
                }
                let rest = current.split_off(split);
                lines.push(Line::new(&current, paint, false));
                current = rest;
            }
        }
        lines.push(Line::new(&current, paint, i < last));
    }
    lines
}

// =========================================================================
// TextLayout
// =========================================================================

/// Either layout kind.
#[derive(Debug, Clone)]
pub enum TextLayout {
    Boring(BoringLayout),
    Static(StaticLayout),
}

impl TextLayout {
    pub fn id(&self) -> LayoutId {
        match self {
            TextLayout::Boring(l) => l.id,
            TextLayout::Static(l) => l.id,
        }
    }

    pub fn is_boring(&self) -> bool {
        matches!(self, TextLayout::Boring(_))
    }

    pub fn width(&self) -> i32 {
        match self {
            TextLayout::Boring(l) => l.width,
            TextLayout::Static(l) => l.width,
        }
    }

    pub fn ellipsized_width(&self) -> i32 {
        match self {
            TextLayout::Boring(l) => l.ellipsized_width,
            TextLayout::Static(l) => l.ellipsized_width,
        }
    }

    fn lines(&self) -> &[Line] {
        match self {
            TextLayout::Boring(l) => std::slice::from_ref(&l.line),
            TextLayout::Static(l) => &l.lines,
        }
    }

    fn metrics(&self) -> &LineMetrics {
        match self {
            TextLayout::Boring(l) => &l.metrics,
            TextLayout::Static(l) => &l.metrics,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines().len()
    }

    /// Top of `line`; `line_top(line_count())` is the full height.
    pub fn line_top(&self, line: usize) -> i32 {
        self.metrics().line_top(line, self.line_count())
    }

    pub fn height(&self) -> i32 {
        self.line_top(self.line_count())
    }

    pub fn line_width(&self, line: usize) -> f32 {
        self.lines()[line].width
    }

    pub fn line_text(&self, line: usize) -> &str {
        &self.lines()[line].text
    }

    /// Whether `line` ends at an explicit line break rather than a wrap.
    pub fn line_ends_with_break(&self, line: usize) -> bool {
        self.lines()[line].hard_break
    }

    /// Widest line, if the layout width did not influence where lines
    /// break (every line but the last ends with an explicit break).
    pub fn desired_width(&self) -> Option<i32> {
        let count = self.line_count();
        if (0..count.saturating_sub(1)).any(|i| !self.line_ends_with_break(i)) {
            return None;
        }
        let widest = self.lines().iter().map(|l| l.width).fold(0.0_f32, f32::max);
        Some(widest.ceil() as i32)
    }

    /// Grow the layout width without re-breaking lines.
    pub fn increase_width_to(&mut self, width: i32) {
        match self {
            TextLayout::Boring(l) => {
                l.width = width;
                if l.ellipsis.is_none() {
                    l.ellipsized_width = width;
                }
            }
            TextLayout::Static(l) => {
                if l.ellipsized_width == l.width {
                    l.ellipsized_width = width;
                }
                l.width = width;
            }
        }
    }

    pub fn draw(&self, canvas: &mut Canvas, color: Color) {
        let (alignment, width, font_size) = match self {
            TextLayout::Boring(l) => (l.alignment, l.width, l.font_size),
            TextLayout::Static(l) => (l.alignment, l.width, l.font_size),
        };
        draw_lines(canvas, self.lines(), self.metrics(), alignment, width, font_size, color);
    }
}

// =========================================================================
// Tests
// =========================================================================
