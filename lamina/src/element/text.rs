//! TextElement - single or multi-line text.
//!
//! The element keeps one built [`TextLayout`] and rebuilds it only when the
//! measured width, the max line count or a paint property changes. Text that
//! fits a single line uses a [`BoringLayout`], which is rebuilt in place
//! rather than reallocated whenever one is available for reuse.

use std::sync::Arc;

use crate::canvas::Canvas;
use crate::drawable::{ColorStateList, DrawableState};
use crate::element::{Element, ElementCore, ElementExt};
use crate::measure::{Dimension, MeasureMode, MeasureSpec};
use crate::primitives::{Color, IntSize, Rect};
use crate::text::{
    is_boring, Alignment, BoringLayout, BoringMetrics, LayoutInput, LineSpacing, StaticLayout,
    TextLayout, TextMeasurer, TextPaint, TruncateAt,
};

/// Outcome of asking whether the text fits the single-line fast path.
#[derive(Debug, Clone, Copy)]
enum BoringProbe {
    /// Not asked yet.
    Unknown,
    NotBoring,
    Boring(BoringMetrics),
}

pub struct TextElement {
    core: ElementCore,
    text: String,
    paint: TextPaint,
    text_color: ColorStateList,
    current_color: Color,
    max_lines: usize,
    /// Max lines the current layout was built for.
    old_max_lines: usize,
    spacing: LineSpacing,
    include_font_padding: bool,
    alignment: Alignment,
    ellipsize: Option<TruncateAt>,
    layout: Option<TextLayout>,
    saved_layout: Option<BoringLayout>,
    /// The paint's measurer changed since `layout` was built. The layout
    /// stays drawable until the next measure rebuilds it.
    measurer_changed: bool,
}

impl Default for TextElement {
    fn default() -> Self {
        Self::new()
    }
}

impl TextElement {
    pub fn new() -> Self {
        let text_color = ColorStateList::solid(Color::BLACK);
        Self {
            core: ElementCore::new(),
            text: String::new(),
            paint: TextPaint::default(),
            current_color: text_color.color_for_state(DrawableState::EMPTY),
            text_color,
            max_lines: usize::MAX,
            old_max_lines: usize::MAX,
            spacing: LineSpacing::default(),
            include_font_padding: true,
            alignment: Alignment::Normal,
            ellipsize: None,
            layout: None,
            saved_layout: None,
            measurer_changed: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.text == text {
            return;
        }
        self.text = text;
        self.check_for_relayout();
    }

    pub fn paint(&self) -> &TextPaint {
        &self.paint
    }

    /// The layout built by the last measure, if it is still current.
    pub fn text_layout(&self) -> Option<&TextLayout> {
        self.layout.as_ref()
    }

    pub fn text_size(&self) -> f32 {
        self.paint.font_size
    }

    /// Set the text size in pixels.
    pub fn set_text_size(&mut self, size: f32) {
        if self.paint.font_size == size {
            return;
        }
        self.paint.font_size = size;
        self.recreate_layout();
    }

    pub fn set_text_alignment(&mut self, alignment: Alignment) {
        if self.alignment == alignment {
            return;
        }
        self.alignment = alignment;
        self.recreate_layout();
    }

    pub fn set_line_spacing(&mut self, spacing: LineSpacing) {
        if self.spacing == spacing {
            return;
        }
        self.spacing = spacing;
        self.recreate_layout();
    }

    pub fn set_include_font_padding(&mut self, include: bool) {
        if self.include_font_padding == include {
            return;
        }
        self.include_font_padding = include;
        self.recreate_layout();
    }

    pub fn ellipsize(&self) -> Option<TruncateAt> {
        self.ellipsize
    }

    pub fn set_ellipsize(&mut self, ellipsize: Option<TruncateAt>) {
        if self.ellipsize == ellipsize {
            return;
        }
        self.ellipsize = ellipsize;
        self.recreate_layout();
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Takes effect on the next measure.
    pub fn set_max_lines(&mut self, max_lines: usize) {
        if self.max_lines == max_lines {
            return;
        }
        self.max_lines = max_lines;
        self.request_layout();
        self.invalidate();
    }

    pub fn current_text_color(&self) -> Color {
        self.current_color
    }

    pub fn set_text_color(&mut self, colors: impl Into<ColorStateList>) {
        self.text_color = colors.into();
        self.update_text_colors();
    }

    fn update_text_colors(&mut self) {
        let state = self
            .core
            .host()
            .map_or(DrawableState::EMPTY, |host| host.drawable_state());
        let color = self.text_color.color_for_state(state);
        if color != self.current_color {
            self.current_color = color;
            self.invalidate();
        }
    }

    /// Widest line of the current layout, or `None` when its lines were
    /// wrapped to the layout width.
    fn desired_width(&self) -> Option<i32> {
        self.layout.as_ref().and_then(TextLayout::desired_width)
    }

    fn desired_height(&self) -> i32 {
        let Some(layout) = &self.layout else {
            return 0;
        };
        let line = self.max_lines.min(layout.line_count());
        layout.line_top(line) + self.core.padding.vertical()
    }

    /// Width of the widest paragraph, ignoring any wrapping.
    fn text_extent(&self) -> i32 {
        self.text
            .split('\n')
            .map(|line| self.paint.measure(line))
            .fold(0.0_f32, f32::max)
            .ceil() as i32
    }

    /// Keep a boring layout that is about to be dropped so its allocation
    /// can be reused by the next build.
    fn stash(&mut self, layout: Option<TextLayout>) {
        if let Some(TextLayout::Boring(boring)) = layout {
            if self.saved_layout.is_none() {
                self.saved_layout = Some(boring);
            }
        }
    }

    fn make_new_layout(&mut self, want_width: i32, boring: BoringProbe, ellipsis_width: i32) {
        let old = self.layout.take();
        self.stash(old);
        self.old_max_lines = self.max_lines;
        self.layout = Some(self.make_single_layout(want_width.max(0), boring, ellipsis_width));
    }

    fn make_single_layout(&mut self, want_width: i32, boring: BoringProbe, ellipsis_width: i32) -> TextLayout {
        let boring = match boring {
            BoringProbe::Unknown => match is_boring(&self.text, &self.paint) {
                Some(metrics) => BoringProbe::Boring(metrics),
                None => BoringProbe::NotBoring,
            },
            known => known,
        };

        let input = LayoutInput {
            text: &self.text,
            paint: &self.paint,
            width: want_width,
            alignment: self.alignment,
            spacing: self.spacing,
            include_pad: self.include_font_padding,
        };
        let ellipsis = self.ellipsize.map(|mode| (mode, ellipsis_width));

        match boring {
            BoringProbe::Boring(metrics) if metrics.width <= want_width => {
                // Fits on one line. The ellipsis only applies when the
                // ellipsis width is narrower than the line.
                let ellipsis = ellipsis.filter(|_| metrics.width > ellipsis_width);
                TextLayout::Boring(BoringLayout::replace_or_make(
                    self.saved_layout.take(),
                    input,
                    &metrics,
                    ellipsis,
                ))
            }
            _ if ellipsis.is_some() => {
                TextLayout::Static(StaticLayout::new(input, ellipsis, self.max_lines))
            }
            _ => TextLayout::Static(StaticLayout::new(input, None, usize::MAX)),
        }
    }

    /// Rebuild after a text change, requesting a relayout only when the
    /// element's size can change with it.
    fn check_for_relayout(&mut self) {
        let Some(layout) = &self.layout else {
            return;
        };
        let params = self.core.layout_params.unwrap_or_default();
        if params.width() == Dimension::WrapContent {
            self.recreate_layout();
            return;
        }

        let old_height = layout.height();
        let old_width = layout.width();
        self.make_new_layout(old_width, BoringProbe::Unknown, old_width);

        let new_height = self.layout.as_ref().map_or(0, TextLayout::height);
        let fixed_height = matches!(params.height(), Dimension::Fixed(_));
        if !fixed_height && new_height != old_height {
            self.request_layout();
        }
        self.invalidate();
    }

    /// Drop the layout so the next measure rebuilds it.
    fn recreate_layout(&mut self) {
        if self.layout.is_none() {
            return;
        }
        let old = self.layout.take();
        self.stash(old);
        self.request_layout();
        self.invalidate();
    }
}

impl Element for TextElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn on_measure(&mut self, width: MeasureSpec, height: MeasureSpec) -> IntSize {
        let padding = self.core.padding;
        let measurer_changed = std::mem::take(&mut self.measurer_changed);
        let mut boring = BoringProbe::Unknown;
        let mut desired = None;

        let measured_width = if width.mode == MeasureMode::Exactly {
            width.size
        } else {
            if self.ellipsize.is_none() && !measurer_changed {
                desired = self.desired_width();
            }
            let mut w = match desired {
                Some(d) => d,
                None => match is_boring(&self.text, &self.paint) {
                    Some(metrics) => {
                        boring = BoringProbe::Boring(metrics);
                        metrics.width
                    }
                    None => {
                        boring = BoringProbe::NotBoring;
                        self.text_extent()
                    }
                },
            };
            w += padding.horizontal();
            if width.mode == MeasureMode::AtMost {
                w = w.min(width.size);
            }
            w
        };

        let unpadded = measured_width - padding.horizontal();
        let mut grow = false;
        let rebuild = match &self.layout {
            None => true,
            Some(_) if measurer_changed => true,
            Some(layout) => {
                let layout_changed = layout.width() != unpadded || layout.ellipsized_width() != unpadded;
                let width_grew = self.ellipsize.is_none()
                    && unpadded > layout.width()
                    && (layout.is_boring() || desired.is_some_and(|d| d <= unpadded));
                let max_changed = self.max_lines != self.old_max_lines;

                grow = layout_changed && !max_changed && width_grew;
                (layout_changed || max_changed) && !grow
            }
        };
        if grow {
            if let Some(layout) = &mut self.layout {
                layout.increase_width_to(unpadded);
            }
        } else if rebuild {
            self.make_new_layout(unpadded, boring, unpadded);
        }

        let measured_height = if height.mode == MeasureMode::Exactly {
            height.size
        } else {
            height.resolve(self.desired_height())
        };
        IntSize::new(measured_width, measured_height)
    }

    fn on_draw(&self, canvas: &mut Canvas) {
        let Some(layout) = &self.layout else {
            return;
        };
        let p = self.core.padding;
        let count = canvas.save();
        canvas.clip_rect(Rect::from_edges(
            p.left as f32,
            p.top as f32,
            (self.width() - p.right) as f32,
            (self.height() - p.bottom) as f32,
        ));
        canvas.translate(p.left as f32, p.top as f32);
        layout.draw(canvas, self.current_color);
        canvas.restore_to_count(count);
    }

    fn on_attached(&mut self) {
        let Some(host) = self.core.host() else {
            return;
        };
        let measurer: &Arc<dyn TextMeasurer> = host.resources().text_measurer();
        let same = Arc::as_ptr(measurer) as *const () == Arc::as_ptr(self.paint.measurer()) as *const ();
        if !same {
            self.paint.set_measurer(measurer.clone());
            if self.layout.is_some() {
                self.measurer_changed = true;
                self.request_layout();
            }
        }
        self.update_text_colors();
    }

    fn on_host_state_changed(&mut self) {
        if self.text_color.is_stateful() {
            self.update_text_colors();
        }
    }

    fn on_padding_changed(&mut self) {
        self.recreate_layout();
    }
}

// =========================================================================
// Tests
// =========================================================================
