//! Drawables - things an image element knows how to paint.
//!
//! A drawable paints itself into its bounds. Intrinsic sizes of `-1` mean the
//! drawable has no natural size (a solid color, for instance) and stretches
//! to whatever bounds it is given.
//!
//! Animated drawables talk back to their owner through a
//! [`DrawableCallback`]; the image element installs one that forwards to its
//! host only while attached.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::canvas::{BitmapId, Canvas};
use crate::error::ImageError;
use crate::primitives::{Color, IntRect, Rect};

static NEXT_DRAWABLE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_BITMAP_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique drawable identity, used as the `who` of scheduling calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableId(pub u64);

impl DrawableId {
    pub fn next() -> Self {
        DrawableId(NEXT_DRAWABLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A unit of deferred drawable work, such as the next animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// Receiver for invalidation and scheduling requests from a drawable.
pub trait DrawableCallback: Send + Sync {
    fn invalidate_drawable(&self, who: DrawableId);
    fn schedule_drawable(&self, who: DrawableId, what: TaskId, when: Instant);
    /// `None` cancels every task scheduled for `who`.
    fn unschedule_drawable(&self, who: DrawableId, what: Option<TaskId>);
}

// =========================================================================
// Drawable state
// =========================================================================

/// Interaction state flags a stateful drawable can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DrawableState(u8);

impl DrawableState {
    pub const EMPTY: Self = Self(0);
    pub const ENABLED: Self = Self(1 << 0);
    pub const PRESSED: Self = Self(1 << 1);
    pub const FOCUSED: Self = Self(1 << 2);
    pub const SELECTED: Self = Self(1 << 3);

    /// Whether every flag in `other` is also set here.
    pub fn contains(self, other: DrawableState) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: DrawableState) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for DrawableState {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Colors keyed by drawable state. The first entry whose required flags are
/// all present wins; otherwise the default color applies.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorStateList {
    entries: Vec<(DrawableState, Color)>,
    default: Color,
}

impl ColorStateList {
    /// A list that resolves to `color` in every state.
    pub fn solid(color: Color) -> Self {
        Self {
            entries: Vec::new(),
            default: color,
        }
    }

    pub fn new(default: Color) -> Self {
        Self::solid(default)
    }

    pub fn with_state(mut self, required: DrawableState, color: Color) -> Self {
        self.entries.push((required, color));
        self
    }

    pub fn is_stateful(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn default_color(&self) -> Color {
        self.default
    }

    pub fn color_for_state(&self, state: DrawableState) -> Color {
        self.entries
            .iter()
            .find(|(required, _)| state.contains(*required))
            .map(|(_, color)| *color)
            .unwrap_or(self.default)
    }
}

impl From<Color> for ColorStateList {
    fn from(color: Color) -> Self {
        ColorStateList::solid(color)
    }
}

// =========================================================================
// Drawable trait
// =========================================================================

/// Bookkeeping shared by every drawable.
pub struct DrawableBase {
    id: DrawableId,
    bounds: IntRect,
    visible: bool,
    alpha: f32,
    level: i32,
    callback: Option<Arc<dyn DrawableCallback>>,
}

impl DrawableBase {
    pub fn new() -> Self {
        Self {
            id: DrawableId::next(),
            bounds: IntRect::ZERO,
            visible: true,
            alpha: 1.0,
            level: 0,
            callback: None,
        }
    }

    pub fn invalidate_self(&self) {
        if let Some(callback) = &self.callback {
            callback.invalidate_drawable(self.id);
        }
    }

    pub fn schedule_self(&self, what: TaskId, when: Instant) {
        if let Some(callback) = &self.callback {
            callback.schedule_drawable(self.id, what, when);
        }
    }

    pub fn unschedule_self(&self, what: Option<TaskId>) {
        if let Some(callback) = &self.callback {
            callback.unschedule_drawable(self.id, what);
        }
    }
}

impl Default for DrawableBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DrawableBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawableBase")
            .field("id", &self.id)
            .field("bounds", &self.bounds)
            .field("visible", &self.visible)
            .field("alpha", &self.alpha)
            .field("level", &self.level)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Something that can paint itself into a rectangle.
pub trait Drawable: Send + fmt::Debug {
    fn base(&self) -> &DrawableBase;
    fn base_mut(&mut self) -> &mut DrawableBase;

    /// Paint into `bounds()`.
    fn draw(&self, canvas: &mut Canvas);

    /// Natural width in pixels, or `-1` if there is none.
    fn intrinsic_width(&self) -> i32 {
        -1
    }

    /// Natural height in pixels, or `-1` if there is none.
    fn intrinsic_height(&self) -> i32 {
        -1
    }

    fn id(&self) -> DrawableId {
        self.base().id
    }

    fn bounds(&self) -> IntRect {
        self.base().bounds
    }

    fn set_bounds(&mut self, bounds: IntRect) {
        self.base_mut().bounds = bounds;
    }

    fn is_stateful(&self) -> bool {
        false
    }

    /// Returns `true` if the appearance changed.
    fn set_state(&mut self, _state: DrawableState) -> bool {
        false
    }

    fn level(&self) -> i32 {
        self.base().level
    }

    /// Returns `true` if the appearance changed.
    fn set_level(&mut self, level: i32) -> bool {
        self.base_mut().level = level;
        false
    }

    fn is_visible(&self) -> bool {
        self.base().visible
    }

    /// Returns `true` if the flag changed.
    fn set_visible(&mut self, visible: bool) -> bool {
        let base = self.base_mut();
        let changed = base.visible != visible;
        base.visible = visible;
        changed
    }

    fn alpha(&self) -> f32 {
        self.base().alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.base_mut().alpha = alpha.clamp(0.0, 1.0);
    }

    /// Whether an animation is in progress and needs more frames.
    fn is_running(&self) -> bool {
        false
    }

    fn set_callback(&mut self, callback: Option<Arc<dyn DrawableCallback>>) {
        self.base_mut().callback = callback;
    }
}

// =========================================================================
// Bitmaps
// =========================================================================

/// A decoded RGBA image. Cloning shares the pixels.
#[derive(Clone)]
pub struct Bitmap {
    id: BitmapId,
    pixels: Arc<RgbaImage>,
}

impl Bitmap {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            id: BitmapId(NEXT_BITMAP_ID.fetch_add(1, Ordering::Relaxed)),
            pixels: Arc::new(pixels),
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...).
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ImageError::Empty {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        Ok(Self::new(pixels))
    }

    pub fn id(&self) -> BitmapId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap({:?}, {}x{})", self.id, self.width(), self.height())
    }
}

/// Draws a bitmap stretched to its bounds.
#[derive(Debug)]
pub struct BitmapDrawable {
    base: DrawableBase,
    bitmap: Bitmap,
}

impl BitmapDrawable {
    pub fn new(bitmap: Bitmap) -> Self {
        Self {
            base: DrawableBase::new(),
            bitmap,
        }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }
}

impl Drawable for BitmapDrawable {
    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn draw(&self, canvas: &mut Canvas) {
        canvas.draw_bitmap(self.bitmap.id(), Rect::from(self.base.bounds), self.base.alpha);
    }

    fn intrinsic_width(&self) -> i32 {
        self.bitmap.width() as i32
    }

    fn intrinsic_height(&self) -> i32 {
        self.bitmap.height() as i32
    }
}

/// Fills its bounds with one color. Placeholders are usually these.
#[derive(Debug)]
pub struct ColorDrawable {
    base: DrawableBase,
    color: Color,
    size: Option<(i32, i32)>,
}

impl ColorDrawable {
    pub fn new(color: Color) -> Self {
        Self {
            base: DrawableBase::new(),
            color,
            size: None,
        }
    }

    /// Give the color an intrinsic size.
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

impl Drawable for ColorDrawable {
    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn draw(&self, canvas: &mut Canvas) {
        canvas.draw_rect(Rect::from(self.base.bounds), self.color.with_alpha(self.base.alpha));
    }

    fn intrinsic_width(&self) -> i32 {
        self.size.map_or(-1, |(w, _)| w)
    }

    fn intrinsic_height(&self) -> i32 {
        self.size.map_or(-1, |(_, h)| h)
    }
}

// =========================================================================
// Composite drawables
// =========================================================================

/// Shows the child whose level range contains the current level.
#[derive(Debug)]
pub struct LevelListDrawable {
    base: DrawableBase,
    children: Vec<(i32, i32, Box<dyn Drawable>)>,
    current: Option<usize>,
}

impl LevelListDrawable {
    pub fn new() -> Self {
        Self {
            base: DrawableBase::new(),
            children: Vec::new(),
            current: None,
        }
    }

    /// Add a child shown for levels in `min..=max`.
    pub fn with_level(mut self, min: i32, max: i32, drawable: Box<dyn Drawable>) -> Self {
        self.children.push((min, max, drawable));
        self.current = self.index_for(self.base.level);
        self
    }

    fn index_for(&self, level: i32) -> Option<usize> {
        self.children
            .iter()
            .position(|(min, max, _)| (*min..=*max).contains(&level))
    }

    fn current(&self) -> Option<&dyn Drawable> {
        self.current.map(|i| self.children[i].2.as_ref())
    }
}

impl Default for LevelListDrawable {
    fn default() -> Self {
        Self::new()
    }
}

impl Drawable for LevelListDrawable {
    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn draw(&self, canvas: &mut Canvas) {
        if let Some(child) = self.current() {
            child.draw(canvas);
        }
    }

    fn intrinsic_width(&self) -> i32 {
        self.current().map_or(-1, |c| c.intrinsic_width())
    }

    fn intrinsic_height(&self) -> i32 {
        self.current().map_or(-1, |c| c.intrinsic_height())
    }

    fn set_bounds(&mut self, bounds: IntRect) {
        self.base.bounds = bounds;
        for (_, _, child) in &mut self.children {
            child.set_bounds(bounds);
        }
    }

    fn set_level(&mut self, level: i32) -> bool {
        self.base.level = level;
        let next = self.index_for(level);
        let changed = next != self.current;
        self.current = next;
        changed
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.base.alpha = alpha.clamp(0.0, 1.0);
        for (_, _, child) in &mut self.children {
            child.set_alpha(alpha);
        }
    }
}

/// Shows the first child whose required state flags are all present.
#[derive(Debug)]
pub struct StateListDrawable {
    base: DrawableBase,
    children: Vec<(DrawableState, Box<dyn Drawable>)>,
    current: Option<usize>,
}

impl StateListDrawable {
    pub fn new() -> Self {
        Self {
            base: DrawableBase::new(),
            children: Vec::new(),
            current: None,
        }
    }

    pub fn with_state(mut self, required: DrawableState, drawable: Box<dyn Drawable>) -> Self {
        self.children.push((required, drawable));
        if self.current.is_none() {
            self.current = self.index_for(DrawableState::EMPTY);
        }
        self
    }

    fn index_for(&self, state: DrawableState) -> Option<usize> {
        self.children
            .iter()
            .position(|(required, _)| state.contains(*required))
    }

    fn current(&self) -> Option<&dyn Drawable> {
        self.current.map(|i| self.children[i].1.as_ref())
    }
}

impl Default for StateListDrawable {
    fn default() -> Self {
        Self::new()
    }
}

impl Drawable for StateListDrawable {
    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn draw(&self, canvas: &mut Canvas) {
        if let Some(child) = self.current() {
            child.draw(canvas);
        }
    }

    fn intrinsic_width(&self) -> i32 {
        self.current().map_or(-1, |c| c.intrinsic_width())
    }

    fn intrinsic_height(&self) -> i32 {
        self.current().map_or(-1, |c| c.intrinsic_height())
    }

    fn set_bounds(&mut self, bounds: IntRect) {
        self.base.bounds = bounds;
        for (_, child) in &mut self.children {
            child.set_bounds(bounds);
        }
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn set_state(&mut self, state: DrawableState) -> bool {
        let next = self.index_for(state);
        let changed = next != self.current;
        self.current = next;
        changed
    }
}

/// Default duration of a placeholder-to-image fade.
pub const FADE_DURATION: Duration = Duration::from_millis(300);

/// Cross-fades from a placeholder to a freshly delivered image.
#[derive(Debug)]
pub struct FadeDrawable {
    base: DrawableBase,
    from: Option<Box<dyn Drawable>>,
    to: Box<dyn Drawable>,
    duration: Duration,
    started: Option<Instant>,
}

impl FadeDrawable {
    pub fn new(from: Option<Box<dyn Drawable>>, to: Box<dyn Drawable>) -> Self {
        Self {
            base: DrawableBase::new(),
            from,
            to,
            duration: FADE_DURATION,
            started: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Begin the fade now.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        self.started = Some(now);
        self.base.invalidate_self();
    }

    /// Fraction of the fade completed at `now`, in `0.0..=1.0`.
    pub fn progress_at(&self, now: Instant) -> f32 {
        match self.started {
            None => 0.0,
            Some(_) if self.duration.is_zero() => 1.0,
            Some(start) => {
                let elapsed = now.saturating_duration_since(start);
                (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
            }
        }
    }

    pub fn target(&self) -> &dyn Drawable {
        self.to.as_ref()
    }

    fn draw_at(&self, canvas: &mut Canvas, progress: f32) {
        if progress < 1.0 {
            if let Some(from) = &self.from {
                let count = canvas.save();
                canvas.multiply_alpha(self.base.alpha * (1.0 - progress));
                from.draw(canvas);
                canvas.restore_to_count(count);
            }
        }
        if progress > 0.0 {
            let count = canvas.save();
            canvas.multiply_alpha(self.base.alpha * progress);
            self.to.draw(canvas);
            canvas.restore_to_count(count);
        }
    }
}

impl Drawable for FadeDrawable {
    fn base(&self) -> &DrawableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DrawableBase {
        &mut self.base
    }

    fn draw(&self, canvas: &mut Canvas) {
        let progress = self.progress_at(Instant::now());
        self.draw_at(canvas, progress);
        if progress < 1.0 {
            self.base.invalidate_self();
        }
    }

    fn intrinsic_width(&self) -> i32 {
        self.to.intrinsic_width()
    }

    fn intrinsic_height(&self) -> i32 {
        self.to.intrinsic_height()
    }

    fn set_bounds(&mut self, bounds: IntRect) {
        self.base.bounds = bounds;
        if let Some(from) = &mut self.from {
            from.set_bounds(bounds);
        }
        self.to.set_bounds(bounds);
    }

    fn is_running(&self) -> bool {
        self.started.is_some() && self.progress_at(Instant::now()) < 1.0
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawOp;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingCallback {
        invalidations: Mutex<Vec<DrawableId>>,
    }

    impl DrawableCallback for CountingCallback {
        fn invalidate_drawable(&self, who: DrawableId) {
            self.invalidations.lock().unwrap().push(who);
        }
        fn schedule_drawable(&self, _who: DrawableId, _what: TaskId, _when: Instant) {}
        fn unschedule_drawable(&self, _who: DrawableId, _what: Option<TaskId>) {}
    }

    fn bitmap(width: u32, height: u32) -> Bitmap {
        Bitmap::new(RgbaImage::new(width, height))
    }

    #[test]
    fn test_bitmap_drawable_intrinsic_size() {
        let drawable = BitmapDrawable::new(bitmap(200, 100));
        assert_eq!(drawable.intrinsic_width(), 200);
        assert_eq!(drawable.intrinsic_height(), 100);
    }

    #[test]
    fn test_color_drawable_has_no_intrinsic_size() {
        let drawable = ColorDrawable::new(Color::BLACK);
        assert_eq!(drawable.intrinsic_width(), -1);
        assert_eq!(drawable.intrinsic_height(), -1);
        let sized = ColorDrawable::new(Color::BLACK).with_size(4, 6);
        assert_eq!((sized.intrinsic_width(), sized.intrinsic_height()), (4, 6));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(Bitmap::decode(b"not an image"), Err(ImageError::Decode(_))));
    }

    #[test]
    fn test_level_list_switches_child() {
        let mut drawable = LevelListDrawable::new()
            .with_level(0, 0, Box::new(ColorDrawable::new(Color::BLACK).with_size(10, 10)))
            .with_level(1, 5, Box::new(ColorDrawable::new(Color::WHITE).with_size(20, 20)));

        assert_eq!(drawable.intrinsic_width(), 10);
        assert!(drawable.set_level(3));
        assert_eq!(drawable.intrinsic_width(), 20);
        assert!(!drawable.set_level(4));
        assert!(drawable.set_level(9));
        assert_eq!(drawable.intrinsic_width(), -1);
    }

    #[test]
    fn test_state_list_picks_first_match() {
        let mut drawable = StateListDrawable::new()
            .with_state(DrawableState::PRESSED, Box::new(ColorDrawable::new(Color::BLACK)))
            .with_state(DrawableState::EMPTY, Box::new(ColorDrawable::new(Color::WHITE)));
        drawable.set_bounds(IntRect::new(0, 0, 2, 2));

        let mut canvas = Canvas::new();
        drawable.draw(&mut canvas);
        assert!(drawable.set_state(DrawableState::PRESSED | DrawableState::ENABLED));
        drawable.draw(&mut canvas);

        let colors: Vec<Color> = canvas
            .ops()
            .iter()
            .map(|op| match op {
                DrawOp::Rect { color, .. } => *color,
                other => panic!("unexpected op {other:?}"),
            })
            .collect();
        assert_eq!(colors, vec![Color::WHITE, Color::BLACK]);
    }

    #[test]
    fn test_color_state_list_resolution() {
        let list = ColorStateList::new(Color::BLACK).with_state(DrawableState::SELECTED, Color::WHITE);
        assert_eq!(list.color_for_state(DrawableState::ENABLED), Color::BLACK);
        assert_eq!(
            list.color_for_state(DrawableState::ENABLED | DrawableState::SELECTED),
            Color::WHITE
        );
    }

    #[test]
    fn test_fade_progress_and_invalidation() {
        let callback = Arc::new(CountingCallback::default());
        let placeholder = Box::new(ColorDrawable::new(Color::BLACK));
        let image = Box::new(BitmapDrawable::new(bitmap(8, 8)));
        let mut fade = FadeDrawable::new(Some(placeholder), image).with_duration(Duration::from_millis(100));
        fade.set_callback(Some(callback.clone()));
        assert_eq!(fade.intrinsic_width(), 8);

        let start = Instant::now();
        fade.start_at(start);
        assert_eq!(callback.invalidations.lock().unwrap().len(), 1);
        assert_eq!(fade.progress_at(start), 0.0);
        let halfway = fade.progress_at(start + Duration::from_millis(50));
        assert!((halfway - 0.5).abs() < 1e-4);
        assert_eq!(fade.progress_at(start + Duration::from_secs(1)), 1.0);
    }

    #[test]
    fn test_fade_halfway_draws_both_layers() {
        let placeholder = Box::new(ColorDrawable::new(Color::BLACK));
        let image = Box::new(BitmapDrawable::new(bitmap(8, 8)));
        let mut fade = FadeDrawable::new(Some(placeholder), image);
        fade.set_bounds(IntRect::new(0, 0, 8, 8));

        let mut canvas = Canvas::new();
        fade.draw_at(&mut canvas, 0.5);
        assert_eq!(canvas.len(), 2);
        match &canvas.ops()[1] {
            DrawOp::Bitmap { alpha, .. } => assert_eq!(*alpha, 0.5),
            other => panic!("unexpected op {other:?}"),
        }
    }
}
