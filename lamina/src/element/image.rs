//! ImageElement - shows a drawable scaled into its bounds.

use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Instant;

use crate::canvas::Canvas;
use crate::drawable::{Bitmap, BitmapDrawable, Drawable, DrawableCallback, DrawableId, TaskId};
use crate::element::{Element, ElementCore, ElementExt, Visibility};
use crate::error::ElementError;
use crate::host::Host;
use crate::measure::{MeasureMode, MeasureSpec};
use crate::primitives::{IntRect, IntSize, Matrix};
use crate::resources::ResourceId;

/// How a drawable is fitted into the element's content box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ScaleType {
    /// Use the element's matrix as-is.
    Matrix,
    /// Stretch to fill, ignoring aspect ratio.
    FitXy,
    FitStart,
    #[default]
    FitCenter,
    FitEnd,
    /// Center without scaling.
    Center,
    /// Scale to cover, centering the overflow.
    CenterCrop,
    /// Scale down to fit if needed, then center.
    CenterInside,
}

impl FromStr for ScaleType {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matrix" => Ok(ScaleType::Matrix),
            "fit_xy" => Ok(ScaleType::FitXy),
            "fit_start" => Ok(ScaleType::FitStart),
            "fit_center" => Ok(ScaleType::FitCenter),
            "fit_end" => Ok(ScaleType::FitEnd),
            "center" => Ok(ScaleType::Center),
            "center_crop" => Ok(ScaleType::CenterCrop),
            "center_inside" => Ok(ScaleType::CenterInside),
            other => Err(ElementError::UnknownScaleType(other.to_string())),
        }
    }
}

/// Round half up to a whole pixel.
fn round_px(value: f32) -> f32 {
    (value + 0.5).floor()
}

/// Transform that fits a `dw`x`dh` drawable into a `vw`x`vh` box, or `None`
/// when the drawable is drawn untransformed at its bounds.
pub fn fit_matrix(scale_type: ScaleType, user: &Matrix, dw: i32, dh: i32, vw: i32, vh: i32) -> Option<Matrix> {
    let fits = (dw < 0 || vw == dw) && (dh < 0 || vh == dh);
    let (dwf, dhf, vwf, vhf) = (dw as f32, dh as f32, vw as f32, vh as f32);

    match scale_type {
        ScaleType::FitXy => None,
        ScaleType::Matrix if user.is_identity() => None,
        ScaleType::Matrix => Some(*user),
        _ if fits => None,
        ScaleType::Center => Some(Matrix::translate(
            round_px((vwf - dwf) * 0.5),
            round_px((vhf - dhf) * 0.5),
        )),
        ScaleType::CenterCrop => {
            let (scale, dx, dy) = if dw * vh > vw * dh {
                let scale = vhf / dhf;
                (scale, (vwf - dwf * scale) * 0.5, 0.0)
            } else {
                let scale = vwf / dwf;
                (scale, 0.0, (vhf - dhf * scale) * 0.5)
            };
            Some(Matrix::scale_translate(scale, scale, round_px(dx), round_px(dy)))
        }
        ScaleType::CenterInside => {
            let scale = if dw <= vw && dh <= vh {
                1.0
            } else {
                (vwf / dwf).min(vhf / dhf)
            };
            Some(Matrix::scale_translate(
                scale,
                scale,
                round_px((vwf - dwf * scale) * 0.5),
                round_px((vhf - dhf * scale) * 0.5),
            ))
        }
        ScaleType::FitStart | ScaleType::FitCenter | ScaleType::FitEnd => {
            let scale = (vwf / dwf).min(vhf / dhf);
            let slack_x = vwf - dwf * scale;
            let slack_y = vhf - dhf * scale;
            let (tx, ty) = match scale_type {
                ScaleType::FitStart => (0.0, 0.0),
                ScaleType::FitCenter => (slack_x * 0.5, slack_y * 0.5),
                _ => (slack_x, slack_y),
            };
            Some(Matrix::scale_translate(scale, scale, tx, ty))
        }
    }
}

#[derive(Default)]
struct CallbackTarget {
    host: Option<Weak<dyn Host>>,
    drawable: Option<DrawableId>,
}

/// Forwards drawable requests to the element's host while attached.
#[derive(Default)]
struct ImageCallback {
    target: Mutex<CallbackTarget>,
}

impl ImageCallback {
    fn host(&self) -> (Option<Arc<dyn Host>>, Option<DrawableId>) {
        let target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        (target.host.as_ref().and_then(Weak::upgrade), target.drawable)
    }

    fn set_host(&self, host: Option<Weak<dyn Host>>) {
        self.target.lock().unwrap_or_else(PoisonError::into_inner).host = host;
    }

    fn set_drawable(&self, drawable: Option<DrawableId>) {
        self.target.lock().unwrap_or_else(PoisonError::into_inner).drawable = drawable;
    }
}

impl DrawableCallback for ImageCallback {
    fn invalidate_drawable(&self, who: DrawableId) {
        if let (Some(host), current) = self.host() {
            if current == Some(who) {
                host.invalidate();
            } else {
                host.invalidate_drawable(who);
            }
        }
    }

    fn schedule_drawable(&self, who: DrawableId, what: TaskId, when: Instant) {
        if let (Some(host), _) = self.host() {
            host.schedule_drawable(who, what, when);
        }
    }

    fn unschedule_drawable(&self, who: DrawableId, what: Option<TaskId>) {
        if let (Some(host), _) = self.host() {
            host.unschedule_drawable(who, what);
        }
    }
}

/// Shows a single drawable.
pub struct ImageElement {
    core: ElementCore,
    drawable: Option<Box<dyn Drawable>>,
    resource: Option<ResourceId>,
    drawable_width: i32,
    drawable_height: i32,
    scale_type: ScaleType,
    matrix: Matrix,
    draw_matrix: Option<Matrix>,
    level: i32,
    callback: Arc<ImageCallback>,
}

impl Default for ImageElement {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageElement {
    pub fn new() -> Self {
        Self {
            core: ElementCore::new(),
            drawable: None,
            resource: None,
            drawable_width: -1,
            drawable_height: -1,
            scale_type: ScaleType::default(),
            matrix: Matrix::IDENTITY,
            draw_matrix: None,
            level: 0,
            callback: Arc::new(ImageCallback::default()),
        }
    }

    pub fn drawable(&self) -> Option<&dyn Drawable> {
        self.drawable.as_deref()
    }

    pub fn drawable_mut(&mut self) -> Option<&mut dyn Drawable> {
        match &mut self.drawable {
            Some(d) => Some(d.as_mut()),
            None => None,
        }
    }

    /// Intrinsic size recorded for the current drawable, `-1` if none.
    pub fn drawable_size(&self) -> (i32, i32) {
        (self.drawable_width, self.drawable_height)
    }

    /// Transform applied when drawing, if any.
    pub fn draw_matrix(&self) -> Option<Matrix> {
        self.draw_matrix
    }

    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    pub fn set_scale_type(&mut self, scale_type: ScaleType) {
        if self.scale_type == scale_type {
            return;
        }
        self.scale_type = scale_type;
        self.request_layout();
        self.invalidate();
    }

    /// Matrix used with [`ScaleType::Matrix`].
    pub fn set_image_matrix(&mut self, matrix: Matrix) {
        if self.matrix == matrix {
            return;
        }
        self.matrix = matrix;
        self.configure_bounds();
        self.invalidate();
    }

    pub fn set_image_drawable(&mut self, drawable: Option<Box<dyn Drawable>>) {
        self.resource = None;
        let old = (self.drawable_width, self.drawable_height);
        self.update_drawable(drawable);
        if old != (self.drawable_width, self.drawable_height) {
            self.request_layout();
        }
        self.invalidate();
    }

    pub fn set_image_bitmap(&mut self, bitmap: Bitmap) {
        self.set_image_drawable(Some(Box::new(BitmapDrawable::new(bitmap))));
    }

    /// Show a registered drawable. It is looked up through the host's
    /// resources now if attached, otherwise on the next measure.
    pub fn set_image_resource(&mut self, id: ResourceId) {
        if self.resource == Some(id) {
            return;
        }
        self.update_drawable(None);
        self.resource = Some(id);

        let old = (self.drawable_width, self.drawable_height);
        self.resolve_resource();
        if old != (self.drawable_width, self.drawable_height) {
            self.request_layout();
        }
        self.invalidate();
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn set_image_level(&mut self, level: i32) {
        self.level = level;
        if let Some(drawable) = &mut self.drawable {
            drawable.set_level(level);
            self.resize_from_drawable();
        }
    }

    fn resolve_resource(&mut self) {
        if self.drawable.is_some() {
            return;
        }
        let Some(id) = self.resource else {
            return;
        };
        let Some(host) = self.core.host() else {
            return;
        };

        match host.resources().drawable(id) {
            Ok(drawable) => self.update_drawable(Some(drawable)),
            Err(error) => {
                tracing::warn!(resource = ?id, %error, "unable to find drawable resource");
                self.update_drawable(None);
            }
        }
    }

    fn update_drawable(&mut self, drawable: Option<Box<dyn Drawable>>) {
        if let Some(mut old) = self.drawable.take() {
            old.set_callback(None);
            if let Some(host) = self.core.host() {
                host.unschedule_drawable(old.id(), None);
            }
        }

        match drawable {
            Some(mut d) => {
                let callback: Arc<dyn DrawableCallback> = self.callback.clone();
                d.set_callback(Some(callback));
                self.callback.set_drawable(Some(d.id()));

                if d.is_stateful() {
                    if let Some(host) = self.core.host() {
                        d.set_state(host.drawable_state());
                    }
                }
                d.set_level(self.level);
                d.set_visible(self.core.visibility == Visibility::Visible);

                self.drawable_width = d.intrinsic_width();
                self.drawable_height = d.intrinsic_height();
                self.drawable = Some(d);
                self.configure_bounds();
            }
            None => {
                self.callback.set_drawable(None);
                self.drawable_width = -1;
                self.drawable_height = -1;
            }
        }
    }

    fn resize_from_drawable(&mut self) {
        let Some(drawable) = &self.drawable else {
            return;
        };
        let mut width = drawable.intrinsic_width();
        if width < 0 {
            width = self.drawable_width;
        }
        let mut height = drawable.intrinsic_height();
        if height < 0 {
            height = self.drawable_height;
        }

        if (width, height) != (self.drawable_width, self.drawable_height) {
            self.drawable_width = width;
            self.drawable_height = height;
            self.request_layout();
        }
    }

    fn configure_bounds(&mut self) {
        let Some(drawable) = &mut self.drawable else {
            return;
        };
        let (dw, dh) = (self.drawable_width, self.drawable_height);
        let p = self.core.padding;
        let vw = self.core.bounds.width() - p.horizontal();
        let vh = self.core.bounds.height() - p.vertical();

        if dw <= 0 || dh <= 0 || self.scale_type == ScaleType::FitXy {
            drawable.set_bounds(IntRect::new(0, 0, vw, vh));
            self.draw_matrix = None;
        } else {
            drawable.set_bounds(IntRect::new(0, 0, dw, dh));
            self.draw_matrix = fit_matrix(self.scale_type, &self.matrix, dw, dh, vw, vh);
        }
    }

    fn measure_axis(spec: MeasureSpec, has_drawable: bool, intrinsic: i32, padding: i32) -> i32 {
        if spec.mode == MeasureMode::Exactly {
            return spec.size;
        }
        let desired = if has_drawable { intrinsic.max(1) + padding } else { 0 };
        spec.resolve(desired)
    }
}

impl Element for ImageElement {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn on_measure(&mut self, width: MeasureSpec, height: MeasureSpec) -> IntSize {
        self.resolve_resource();

        let has_drawable = self.drawable.is_some();
        if !has_drawable {
            self.drawable_width = -1;
            self.drawable_height = -1;
        }
        let p = self.core.padding;
        IntSize::new(
            Self::measure_axis(width, has_drawable, self.drawable_width, p.horizontal()),
            Self::measure_axis(height, has_drawable, self.drawable_height, p.vertical()),
        )
    }

    fn on_layout(&mut self, _bounds: IntRect) {
        self.configure_bounds();
    }

    fn on_draw(&self, canvas: &mut Canvas) {
        let Some(drawable) = &self.drawable else {
            return;
        };
        if self.drawable_width == 0 || self.drawable_height == 0 {
            return;
        }

        let p = self.core.padding;
        if self.draw_matrix.is_none() && p.left == 0 && p.top == 0 {
            drawable.draw(canvas);
        } else {
            let count = canvas.save();
            canvas.translate(p.left as f32, p.top as f32);
            if let Some(matrix) = &self.draw_matrix {
                canvas.concat(matrix);
            }
            drawable.draw(canvas);
            canvas.restore_to_count(count);
        }
    }

    fn on_attached(&mut self) {
        self.callback.set_host(self.core.host.clone());
        let visible = self.core.visibility == Visibility::Visible;
        if let Some(drawable) = &mut self.drawable {
            drawable.set_visible(visible);
        }
    }

    fn on_detached(&mut self) {
        if let Some(drawable) = &mut self.drawable {
            if let Some(host) = self.core.host() {
                host.unschedule_drawable(drawable.id(), None);
            }
            drawable.set_visible(false);
        }
        self.callback.set_host(None);
    }

    fn on_host_state_changed(&mut self) {
        let Some(host) = self.core.host() else {
            return;
        };
        if let Some(drawable) = &mut self.drawable {
            if drawable.is_stateful() && drawable.set_state(host.drawable_state()) {
                self.invalidate();
            }
        }
    }

    fn on_visibility_changed(&mut self, visibility: Visibility) {
        if let Some(drawable) = &mut self.drawable {
            drawable.set_visible(visibility == Visibility::Visible);
        }
    }

    fn on_padding_changed(&mut self) {
        self.configure_bounds();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawOp;
    use crate::drawable::{ColorDrawable, DrawableState, LevelListDrawable, StateListDrawable};
    use crate::measure::Padding;
    use crate::primitives::{Color, Rect};
    use crate::resources::Resources;
    use crate::testing::RecordingSurface;
    use image::RgbaImage;

    fn image_of(width: u32, height: u32) -> ImageElement {
        let mut el = ImageElement::new();
        el.set_image_bitmap(Bitmap::new(RgbaImage::new(width, height)));
        el
    }

    fn laid_out(mut el: ImageElement, width: i32, height: i32) -> ImageElement {
        el.measure(MeasureSpec::exactly(width), MeasureSpec::exactly(height));
        el.layout(0, 0, width, height);
        el
    }

    #[test]
    fn test_center_crop_wide_image() {
        let mut el = image_of(200, 100);
        el.set_scale_type(ScaleType::CenterCrop);
        let el = laid_out(el, 100, 100);

        let m = el.draw_matrix().unwrap();
        assert_eq!(m.sx, 1.0);
        assert_eq!(m.sy, 1.0);
        assert_eq!(m.tx, -50.0);
        assert_eq!(m.ty, 0.0);
    }

    #[test]
    fn test_center_crop_tall_image() {
        let m = fit_matrix(ScaleType::CenterCrop, &Matrix::IDENTITY, 50, 100, 100, 100).unwrap();
        assert_eq!(m.sx, 2.0);
        assert_eq!(m.tx, 0.0);
        assert_eq!(m.ty, -50.0);
    }

    #[test]
    fn test_center_translates_without_scaling() {
        let m = fit_matrix(ScaleType::Center, &Matrix::IDENTITY, 20, 10, 100, 100).unwrap();
        assert_eq!((m.sx, m.sy), (1.0, 1.0));
        assert_eq!((m.tx, m.ty), (40.0, 45.0));
    }

    #[test]
    fn test_center_inside_only_scales_down() {
        let small = fit_matrix(ScaleType::CenterInside, &Matrix::IDENTITY, 20, 10, 100, 100).unwrap();
        assert_eq!(small.sx, 1.0);
        assert_eq!((small.tx, small.ty), (40.0, 45.0));

        let large = fit_matrix(ScaleType::CenterInside, &Matrix::IDENTITY, 400, 200, 100, 100).unwrap();
        assert_eq!(large.sx, 0.25);
        assert_eq!((large.tx, large.ty), (0.0, 25.0));
    }

    #[test]
    fn test_fit_alignments() {
        let start = fit_matrix(ScaleType::FitStart, &Matrix::IDENTITY, 200, 100, 100, 100).unwrap();
        let center = fit_matrix(ScaleType::FitCenter, &Matrix::IDENTITY, 200, 100, 100, 100).unwrap();
        let end = fit_matrix(ScaleType::FitEnd, &Matrix::IDENTITY, 200, 100, 100, 100).unwrap();
        assert_eq!(start.sx, 0.5);
        assert_eq!(start.ty, 0.0);
        assert_eq!(center.ty, 25.0);
        assert_eq!(end.ty, 50.0);
    }

    #[test]
    fn test_exact_fit_and_fit_xy_need_no_matrix() {
        assert_eq!(fit_matrix(ScaleType::CenterCrop, &Matrix::IDENTITY, 100, 100, 100, 100), None);
        assert_eq!(fit_matrix(ScaleType::FitXy, &Matrix::IDENTITY, 200, 100, 100, 100), None);

        let el = laid_out(
            {
                let mut el = image_of(200, 100);
                el.set_scale_type(ScaleType::FitXy);
                el
            },
            100,
            100,
        );
        assert_eq!(el.drawable().unwrap().bounds(), IntRect::new(0, 0, 100, 100));
    }

    #[test]
    fn test_matrix_scale_type_uses_caller_matrix() {
        let user = Matrix::scale(3.0, 3.0);
        assert_eq!(fit_matrix(ScaleType::Matrix, &user, 10, 10, 10, 10), Some(user));
        assert_eq!(fit_matrix(ScaleType::Matrix, &Matrix::IDENTITY, 10, 20, 30, 40), None);
    }

    #[test]
    fn test_scale_type_from_str() {
        assert_eq!("center_crop".parse::<ScaleType>().unwrap(), ScaleType::CenterCrop);
        assert!(matches!(
            "zoom".parse::<ScaleType>(),
            Err(ElementError::UnknownScaleType(s)) if s == "zoom"
        ));
    }

    #[test]
    fn test_measure_without_drawable() {
        let mut el = ImageElement::new();
        el.measure(MeasureSpec::at_most(50), MeasureSpec::unspecified());
        assert_eq!(el.measured_size(), IntSize::ZERO);
        assert_eq!(el.drawable_size(), (-1, -1));
    }

    #[test]
    fn test_measure_intrinsic_plus_padding() {
        let mut el = image_of(30, 20);
        el.set_padding(Padding::all(2));
        el.measure(MeasureSpec::unspecified(), MeasureSpec::at_most(10));
        assert_eq!(el.measured_size(), IntSize::new(34, 10));
    }

    #[test]
    fn test_draw_applies_padding_and_matrix() {
        let mut el = image_of(200, 100);
        el.set_scale_type(ScaleType::CenterCrop);
        el.set_padding(Padding::all(10));
        let el = laid_out(el, 120, 120);

        let mut canvas = Canvas::new();
        el.draw(&mut canvas);
        match &canvas.ops()[0] {
            DrawOp::Bitmap { rect, clip, .. } => {
                // 200x100 scaled to 200x100 in a 100x100 box, shifted -50 then +10.
                assert_eq!(*rect, Rect::new(-40.0, 10.0, 200.0, 100.0));
                assert_eq!(*clip, Some(Rect::new(0.0, 0.0, 120.0, 120.0)));
            }
            other => panic!("unexpected op {other:?}"),
        }
        assert_eq!(canvas.save_count(), 0);
    }

    #[test]
    fn test_callbacks_forward_only_while_attached() {
        let surface = RecordingSurface::new();
        let host = surface.host();
        let mut el = ImageElement::new();
        el.set_image_drawable(Some(Box::new(ColorDrawable::new(Color::BLACK))));
        let who = el.drawable().unwrap().id();

        let callback = el.callback.clone();
        callback.schedule_drawable(who, TaskId(1), Instant::now());
        assert!(surface.scheduled().is_empty());

        el.swap_host(Some(&host));
        callback.schedule_drawable(who, TaskId(1), Instant::now());
        callback.invalidate_drawable(who);
        assert_eq!(surface.scheduled(), vec![(who, TaskId(1))]);
        assert_eq!(surface.full_invalidations(), 1);

        el.swap_host(None);
        assert_eq!(surface.unscheduled(), vec![(who, None)]);
        assert!(!el.drawable().unwrap().is_visible());
        callback.schedule_drawable(who, TaskId(2), Instant::now());
        assert_eq!(surface.scheduled().len(), 1);
    }

    #[test]
    fn test_visibility_is_mirrored_on_drawable() {
        let mut el = image_of(4, 4);
        assert!(el.drawable().unwrap().is_visible());
        el.set_visibility(Visibility::Invisible);
        assert!(!el.drawable().unwrap().is_visible());
        el.set_visibility(Visibility::Visible);
        assert!(el.drawable().unwrap().is_visible());
    }

    #[test]
    fn test_resource_resolved_lazily_on_measure() {
        let mut resources = Resources::default();
        resources.register_drawable(ResourceId(3), "avatar", || {
            Box::new(ColorDrawable::new(Color::WHITE).with_size(16, 16))
        });
        let surface = RecordingSurface::with_resources(resources);
        let host = surface.host();

        let mut el = ImageElement::new();
        el.set_image_resource(ResourceId(3));
        assert!(el.drawable().is_none());

        el.swap_host(Some(&host));
        el.measure(MeasureSpec::unspecified(), MeasureSpec::unspecified());
        assert_eq!(el.measured_size(), IntSize::new(16, 16));
    }

    #[test]
    fn test_missing_resource_leaves_element_empty() {
        let surface = RecordingSurface::new();
        let host = surface.host();
        let mut el = ImageElement::new();
        el.swap_host(Some(&host));
        el.set_image_resource(ResourceId(99));
        el.measure(MeasureSpec::unspecified(), MeasureSpec::unspecified());
        assert!(el.drawable().is_none());
        assert_eq!(el.measured_size(), IntSize::ZERO);
    }

    #[test]
    fn test_level_change_resizes() {
        let surface = RecordingSurface::new();
        let host = surface.host();
        let mut el = ImageElement::new();
        el.swap_host(Some(&host));
        el.set_image_drawable(Some(Box::new(
            LevelListDrawable::new()
                .with_level(0, 0, Box::new(ColorDrawable::new(Color::BLACK).with_size(8, 8)))
                .with_level(1, 1, Box::new(ColorDrawable::new(Color::BLACK).with_size(12, 6))),
        )));
        let before = surface.layout_requests();

        el.set_image_level(1);
        assert_eq!(el.drawable_size(), (12, 6));
        assert_eq!(surface.layout_requests(), before + 1);
    }

    #[test]
    fn test_host_state_reaches_stateful_drawable() {
        let surface = RecordingSurface::new();
        let host = surface.host();
        let mut el = ImageElement::new();
        el.set_image_drawable(Some(Box::new(
            StateListDrawable::new()
                .with_state(DrawableState::PRESSED, Box::new(ColorDrawable::new(Color::BLACK)))
                .with_state(DrawableState::EMPTY, Box::new(ColorDrawable::new(Color::WHITE))),
        )));
        el.swap_host(Some(&host));
        let el_rects = surface.invalidated_rects().len();

        surface.set_drawable_state(DrawableState::PRESSED);
        el.host_state_changed();
        assert_eq!(surface.invalidated_rects().len(), el_rects + 1);
    }
}
