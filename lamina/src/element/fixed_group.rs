//! Fixed-composition groups.
//!
//! A [`FixedGroup`] owns a closed set of leaf children created through its
//! own factory. The element embedding it decides where each child goes with
//! explicit pixel math in its `on_measure`/`on_layout`; there is no generic
//! constraint resolution here.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::canvas::Canvas;
use crate::element::image::ImageElement;
use crate::element::text::TextElement;
use crate::element::{Element, ElementCore, ElementExt, Visibility};
use crate::error::ElementError;

/// Leaf kinds a fixed group can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Image,
    Text,
}

impl FromStr for ElementKind {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(ElementKind::Image),
            "text" => Ok(ElementKind::Text),
            other => Err(ElementError::UnknownElementType(other.to_string())),
        }
    }
}

/// A child of a fixed group.
pub enum Leaf {
    Image(ImageElement),
    Text(TextElement),
}

impl Leaf {
    pub fn kind(&self) -> ElementKind {
        match self {
            Leaf::Image(_) => ElementKind::Image,
            Leaf::Text(_) => ElementKind::Text,
        }
    }

    pub fn as_element(&self) -> &dyn Element {
        match self {
            Leaf::Image(e) => e,
            Leaf::Text(e) => e,
        }
    }

    pub fn as_element_mut(&mut self) -> &mut dyn Element {
        match self {
            Leaf::Image(e) => e,
            Leaf::Text(e) => e,
        }
    }
}

static NEXT_GROUP: AtomicU64 = AtomicU64::new(1);

/// Index of a child tagged with the group that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotIndex {
    group: u64,
    index: usize,
}

/// Handle to an image child. Only valid with the group that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSlot(SlotIndex);

/// Handle to a text child. Only valid with the group that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextSlot(SlotIndex);

/// Element core plus internally created children, in drawing order.
pub struct FixedGroup {
    id: u64,
    core: ElementCore,
    children: Vec<Leaf>,
}

impl Default for FixedGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedGroup {
    pub fn new() -> Self {
        Self {
            id: NEXT_GROUP.fetch_add(1, Ordering::Relaxed),
            core: ElementCore::default(),
            children: Vec::new(),
        }
    }

    pub fn core(&self) -> &ElementCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    /// Create a child of `kind`, attached to the group's host, and return
    /// its index.
    pub fn create(&mut self, kind: ElementKind) -> usize {
        let mut leaf = match kind {
            ElementKind::Image => Leaf::Image(ImageElement::new()),
            ElementKind::Text => Leaf::Text(TextElement::new()),
        };
        let host = self.core.host();
        leaf.as_element_mut().swap_host(host.as_ref());
        self.children.push(leaf);
        self.children.len() - 1
    }

    fn slot(&self, index: usize) -> SlotIndex {
        SlotIndex { group: self.id, index }
    }

    /// Panics when `slot` came from another group.
    fn index_of(&self, slot: SlotIndex) -> usize {
        assert_eq!(slot.group, self.id, "slot belongs to another group");
        slot.index
    }

    pub fn add_image(&mut self) -> ImageSlot {
        let index = self.create(ElementKind::Image);
        ImageSlot(self.slot(index))
    }

    pub fn add_text(&mut self) -> TextSlot {
        let index = self.create(ElementKind::Text);
        TextSlot(self.slot(index))
    }

    pub fn image(&self, slot: ImageSlot) -> &ImageElement {
        match &self.children[self.index_of(slot.0)] {
            Leaf::Image(e) => e,
            Leaf::Text(_) => unreachable!("image slot refers to a text child"),
        }
    }

    pub fn image_mut(&mut self, slot: ImageSlot) -> &mut ImageElement {
        let index = self.index_of(slot.0);
        match &mut self.children[index] {
            Leaf::Image(e) => e,
            Leaf::Text(_) => unreachable!("image slot refers to a text child"),
        }
    }

    pub fn text(&self, slot: TextSlot) -> &TextElement {
        match &self.children[self.index_of(slot.0)] {
            Leaf::Text(e) => e,
            Leaf::Image(_) => unreachable!("text slot refers to an image child"),
        }
    }

    pub fn text_mut(&mut self, slot: TextSlot) -> &mut TextElement {
        let index = self.index_of(slot.0);
        match &mut self.children[index] {
            Leaf::Text(e) => e,
            Leaf::Image(_) => unreachable!("text slot refers to an image child"),
        }
    }

    pub fn children(&self) -> &[Leaf] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Implementation of [`Element::for_each_child`] for the embedding element.
    pub fn for_each_child(&self, f: &mut dyn FnMut(&dyn Element)) {
        for child in &self.children {
            f(child.as_element());
        }
    }

    /// Implementation of [`Element::for_each_child_mut`] for the embedding element.
    pub fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn Element)) {
        for child in &mut self.children {
            f(child.as_element_mut());
        }
    }

    /// Draw visible children inside one save/restore pair.
    pub fn draw_children(&self, canvas: &mut Canvas) {
        let count = canvas.save();
        for child in &self.children {
            let child = child.as_element();
            if child.visibility() == Visibility::Visible {
                child.draw(canvas);
            }
        }
        canvas.restore_to_count(count);
    }
}

// =========================================================================
// Tests
// =========================================================================
