//! Canvas - recording draw target with a save/restore state stack.
//!
//! Elements draw in local coordinates; the canvas keeps the current
//! transform and clip and records every primitive in device space together
//! with the clip that was active when it was added. A renderer (or a test)
//! consumes the recorded [`DrawOp`]s.

use crate::primitives::{Color, Matrix, Point, Rect};

/// Identity of a decoded bitmap, shared by every drawable that shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitmapId(pub u64);

/// A recorded primitive, in device coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Solid rectangle.
    Rect {
        rect: Rect,
        color: Color,
        clip: Option<Rect>,
    },
    /// One line of pre-shaped text; `rect` covers the line box.
    Text {
        text: String,
        rect: Rect,
        baseline: f32,
        font_size: f32,
        color: Color,
        clip: Option<Rect>,
    },
    /// A bitmap stretched into `rect`.
    Bitmap {
        bitmap: BitmapId,
        rect: Rect,
        alpha: f32,
        clip: Option<Rect>,
    },
}

impl DrawOp {
    /// Device-space extent of the primitive before clipping.
    pub fn rect(&self) -> Rect {
        match self {
            DrawOp::Rect { rect, .. } | DrawOp::Text { rect, .. } | DrawOp::Bitmap { rect, .. } => *rect,
        }
    }

    /// Clip active when the primitive was recorded.
    pub fn clip(&self) -> Option<Rect> {
        match self {
            DrawOp::Rect { clip, .. } | DrawOp::Text { clip, .. } | DrawOp::Bitmap { clip, .. } => *clip,
        }
    }

    /// The part of the primitive that actually reaches the surface.
    pub fn visible_rect(&self) -> Option<Rect> {
        let rect = self.rect();
        match self.clip() {
            Some(clip) => rect.intersection(&clip),
            None if rect.is_empty() => None,
            None => Some(rect),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CanvasState {
    transform: Matrix,
    clip: Option<Rect>,
    alpha: f32,
}

/// A recording canvas.
#[derive(Debug, Clone)]
pub struct Canvas {
    ops: Vec<DrawOp>,
    state: CanvasState,
    stack: Vec<CanvasState>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create an empty, unclipped canvas.
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            state: CanvasState {
                transform: Matrix::IDENTITY,
                clip: None,
                alpha: 1.0,
            },
            stack: Vec::with_capacity(16),
        }
    }

    /// Create a canvas clipped to a surface of the given size.
    pub fn with_size(width: f32, height: f32) -> Self {
        let mut canvas = Self::new();
        canvas.state.clip = Some(Rect::new(0.0, 0.0, width, height));
        canvas
    }

    /// Drop recorded primitives and reset the state stack.
    pub fn clear(&mut self) {
        self.ops.clear();
        self.stack.clear();
        self.state.transform = Matrix::IDENTITY;
        self.state.alpha = 1.0;
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    // =========================================================================
    // State stack
    // =========================================================================

    /// Number of saved states; `save` returns the count before saving.
    pub fn save_count(&self) -> usize {
        self.stack.len()
    }

    /// Push the current transform and clip.
    pub fn save(&mut self) -> usize {
        let count = self.stack.len();
        self.stack.push(self.state);
        count
    }

    /// Pop one saved state. Unbalanced restores are ignored.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    /// Restore until `save_count() == count`.
    pub fn restore_to_count(&mut self, count: usize) {
        while self.stack.len() > count {
            self.restore();
        }
    }

    /// Current local → device transform.
    pub fn transform(&self) -> Matrix {
        self.state.transform
    }

    /// Current clip in device space.
    pub fn clip_bounds(&self) -> Option<Rect> {
        self.state.clip
    }

    /// Opacity applied to everything drawn in the current state.
    pub fn alpha(&self) -> f32 {
        self.state.alpha
    }

    /// Multiply the current opacity; undone by `restore`.
    pub fn multiply_alpha(&mut self, factor: f32) {
        self.state.alpha *= factor.clamp(0.0, 1.0);
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.concat(&Matrix::translate(dx, dy));
    }

    /// Pre-concatenate `matrix`: it is applied to local coordinates first.
    pub fn concat(&mut self, matrix: &Matrix) {
        self.state.transform = self.state.transform.concat(matrix);
    }

    /// Intersect the clip with a rectangle in local coordinates.
    pub fn clip_rect(&mut self, rect: Rect) {
        let device = self.state.transform.map_rect(&rect);
        self.state.clip = Some(match self.state.clip {
            Some(current) => current
                .intersection(&device)
                .unwrap_or(Rect::new(device.x, device.y, 0.0, 0.0)),
            None => device,
        });
    }

    /// Whether everything drawn now would be clipped away.
    pub fn quick_reject(&self, rect: Rect) -> bool {
        match self.state.clip {
            Some(clip) => !self.state.transform.map_rect(&rect).intersects(&clip),
            None => false,
        }
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    pub fn draw_rect(&mut self, rect: Rect, color: Color) {
        let rect = self.state.transform.map_rect(&rect);
        self.ops.push(DrawOp::Rect {
            rect,
            color: color.with_alpha(self.state.alpha),
            clip: self.state.clip,
        });
    }

    /// Draw one line of text whose line box starts at `origin`.
    pub fn draw_text(
        &mut self,
        text: impl Into<String>,
        origin: Point,
        line_width: f32,
        line_height: f32,
        baseline: f32,
        font_size: f32,
        color: Color,
    ) {
        let rect = self
            .state
            .transform
            .map_rect(&Rect::new(origin.x, origin.y, line_width, line_height));
        let baseline = self.state.transform.map_point(Point::new(origin.x, origin.y + baseline)).y;
        self.ops.push(DrawOp::Text {
            text: text.into(),
            rect,
            baseline,
            font_size: font_size * self.state.transform.sy.abs(),
            color: color.with_alpha(self.state.alpha),
            clip: self.state.clip,
        });
    }

    pub fn draw_bitmap(&mut self, bitmap: BitmapId, dest: Rect, alpha: f32) {
        let rect = self.state.transform.map_rect(&dest);
        self.ops.push(DrawOp::Bitmap {
            bitmap,
            rect,
            alpha: alpha * self.state.alpha,
            clip: self.state.clip,
        });
    }
}

// =========================================================================
// Tests
// =========================================================================
