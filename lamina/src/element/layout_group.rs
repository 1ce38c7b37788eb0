//! Constraint-propagating groups.
//!
//! Children are added from outside with layout params and measured through
//! [`child_measure_spec`]. [`LinearGroup`] stacks them along one axis.

use std::str::FromStr;

use crate::canvas::Canvas;
use crate::element::{draw_children, Element, ElementCore, ElementExt, Visibility};
use crate::error::ElementError;
use crate::measure::{child_measure_spec, LayoutParams, MarginLayoutParams, MeasureSpec};
use crate::primitives::{IntRect, IntSize};

/// A group whose children carry margin layout params.
pub trait LayoutGroup: Element {
    fn children(&self) -> &[Box<dyn Element>];
    fn children_mut(&mut self) -> &mut Vec<Box<dyn Element>>;

    /// Whether `params` can be used as-is by this group.
    fn check_layout_params(&self, params: &LayoutParams) -> bool {
        matches!(params, LayoutParams::Margin(_))
    }

    /// Convert params this group cannot use, keeping the requested size.
    fn generate_layout_params(&self, params: LayoutParams) -> LayoutParams {
        LayoutParams::Margin(MarginLayoutParams::new(params.width(), params.height()))
    }

    fn child_count(&self) -> usize {
        self.children().len()
    }

    fn child_at(&self, index: usize) -> Option<&dyn Element> {
        self.children().get(index).map(|c| &**c)
    }

    /// Append a child with its own layout params, or wrap/wrap if it has
    /// none.
    fn add_child(&mut self, child: Box<dyn Element>) {
        let params = child.layout_params().unwrap_or_default();
        self.add_child_with_params(child, params);
    }

    fn add_child_with_params(&mut self, mut child: Box<dyn Element>, params: LayoutParams) {
        let params = if self.check_layout_params(&params) {
            params
        } else {
            self.generate_layout_params(params)
        };
        child.set_layout_params(params);

        let host = self.core().host();
        child.swap_host(host.as_ref());
        self.children_mut().push(child);
        self.request_layout();
        self.invalidate();
    }

    /// Remove and detach the child at `index`.
    fn remove_child(&mut self, index: usize) -> Option<Box<dyn Element>> {
        if index >= self.children().len() {
            return None;
        }
        let mut child = self.children_mut().remove(index);
        child.swap_host(None);
        self.request_layout();
        self.invalidate();
        Some(child)
    }

    fn find_child_by_id(&self, id: u32) -> Option<&dyn Element> {
        self.children()
            .iter()
            .find(|c| c.id() == Some(id))
            .map(|c| &**c)
    }

    fn find_child_by_id_mut(&mut self, id: u32) -> Option<&mut dyn Element> {
        match self.children_mut().iter_mut().find(|c| c.id() == Some(id)) {
            Some(child) => Some(&mut **child),
            None => None,
        }
    }

    /// Measure the child at `index`, charging the group padding, the
    /// child's margins and the space already used along each axis.
    fn measure_child_with_margins(
        &mut self,
        index: usize,
        parent_width: MeasureSpec,
        width_used: i32,
        parent_height: MeasureSpec,
        height_used: i32,
    ) {
        let padding = self.padding();
        let child = &mut self.children_mut()[index];
        let params = child.layout_params().unwrap_or_default();
        let margins = params.margins();

        let width = child_measure_spec(
            parent_width,
            padding.horizontal() + margins.horizontal() + width_used,
            params.width(),
        );
        let height = child_measure_spec(
            parent_height,
            padding.vertical() + margins.vertical() + height_used,
            params.height(),
        );
        child.measure(width, height);
    }
}

/// Axis a [`LinearGroup`] stacks children along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl FromStr for Orientation {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertical" => Ok(Orientation::Vertical),
            "horizontal" => Ok(Orientation::Horizontal),
            other => Err(ElementError::UnknownOrientation(other.to_string())),
        }
    }
}

/// Stacks children one after another, skipping gone ones.
#[derive(Default)]
pub struct LinearGroup {
    core: ElementCore,
    orientation: Orientation,
    children: Vec<Box<dyn Element>>,
}

impl LinearGroup {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            core: ElementCore::new(),
            orientation,
            children: Vec::new(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.orientation != orientation {
            self.orientation = orientation;
            self.request_layout();
        }
    }
}

impl LayoutGroup for LinearGroup {
    fn children(&self) -> &[Box<dyn Element>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Box<dyn Element>> {
        &mut self.children
    }
}

impl Element for LinearGroup {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn on_measure(&mut self, width: MeasureSpec, height: MeasureSpec) -> IntSize {
        let vertical = self.orientation == Orientation::Vertical;
        // Extent along the stacking axis, and the widest child across it.
        let mut along = 0;
        let mut across = 0;

        for i in 0..self.children.len() {
            if self.children[i].visibility() == Visibility::Gone {
                continue;
            }
            if vertical {
                self.measure_child_with_margins(i, width, 0, height, along);
            } else {
                self.measure_child_with_margins(i, width, along, height, 0);
            }

            let child = &self.children[i];
            let m = child.layout_params().unwrap_or_default().margins();
            let (w, h) = (
                child.measured_width() + m.horizontal(),
                child.measured_height() + m.vertical(),
            );
            if vertical {
                along += h;
                across = across.max(w);
            } else {
                along += w;
                across = across.max(h);
            }
        }

        let p = self.core.padding;
        let (content_w, content_h) = if vertical { (across, along) } else { (along, across) };
        IntSize::new(
            width.resolve(content_w + p.horizontal()),
            height.resolve(content_h + p.vertical()),
        )
    }

    fn on_layout(&mut self, _bounds: IntRect) {
        let p = self.core.padding;
        let vertical = self.orientation == Orientation::Vertical;
        let mut cursor = if vertical { p.top } else { p.left };

        for child in &mut self.children {
            if child.visibility() == Visibility::Gone {
                continue;
            }
            let m = child.layout_params().unwrap_or_default().margins();
            let (w, h) = (child.measured_width(), child.measured_height());
            if vertical {
                let (left, top) = (p.left + m.left, cursor + m.top);
                child.layout(left, top, left + w, top + h);
                cursor = top + h + m.bottom;
            } else {
                let (left, top) = (cursor + m.left, p.top + m.top);
                child.layout(left, top, left + w, top + h);
                cursor = left + w + m.right;
            }
        }
    }

    fn on_draw(&self, canvas: &mut Canvas) {
        draw_children(self, canvas);
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn Element)) {
        for child in &self.children {
            f(&**child);
        }
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Element)) {
        for child in &mut self.children {
            f(&mut **child);
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
