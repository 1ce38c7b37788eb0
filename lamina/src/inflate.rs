//! Build element trees from JSON layout descriptions.
//!
//! ```json
//! {
//!   "type": "linear",
//!   "orientation": "horizontal",
//!   "padding": { "left": 8, "top": 8, "right": 8, "bottom": 8 },
//!   "children": [
//!     { "type": "image", "src": "avatar", "width": 48, "height": 48, "scale_type": "center_crop" },
//!     { "type": "text", "text": "Hello", "width": "match_parent", "max_lines": 2, "ellipsize": "end" }
//!   ]
//! }
//! ```
//!
//! Lengths are pixels. `width` and `height` also accept `"match_parent"` and
//! `"wrap_content"`, the default.

use serde::Deserialize;

use crate::element::fixed_group::ElementKind;
use crate::element::image::{ImageElement, ScaleType};
use crate::element::layout_group::{LayoutGroup, LinearGroup, Orientation};
use crate::element::text::TextElement;
use crate::element::{Element, ElementExt};
use crate::error::ElementError;
use crate::measure::{Dimension, LayoutParams, MarginLayoutParams, Padding};
use crate::primitives::Color;
use crate::resources::Resources;
use crate::text::TruncateAt;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Length {
    Pixels(i32),
    Keyword(String),
}

impl Length {
    fn to_dimension(&self) -> Result<Dimension, ElementError> {
        match self {
            Length::Pixels(px) if *px >= 0 => Ok(Dimension::Fixed(*px)),
            Length::Pixels(px) => Err(ElementError::InvalidDimension(px.to_string())),
            Length::Keyword(k) if k == "match_parent" => Ok(Dimension::MatchParent),
            Length::Keyword(k) if k == "wrap_content" => Ok(Dimension::WrapContent),
            Length::Keyword(k) => Err(ElementError::InvalidDimension(k.clone())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Node {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    width: Option<Length>,
    #[serde(default)]
    height: Option<Length>,
    #[serde(default)]
    margins: Option<Padding>,
    #[serde(default)]
    padding: Option<Padding>,

    // linear
    #[serde(default)]
    orientation: Option<String>,
    #[serde(default)]
    children: Vec<Node>,

    // image
    #[serde(default)]
    src: Option<String>,
    #[serde(default)]
    scale_type: Option<String>,

    // text
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    text_size: Option<f32>,
    #[serde(default)]
    text_color: Option<String>,
    #[serde(default)]
    max_lines: Option<usize>,
    #[serde(default)]
    ellipsize: Option<String>,
}

/// Parse `json` and build the group it describes. The root must be a
/// `linear` group.
pub fn inflate(json: &str, resources: &Resources) -> Result<LinearGroup, ElementError> {
    let root: Node = serde_json::from_str(json)?;
    if root.kind != "linear" {
        return Err(ElementError::RootNotGroup(root.kind));
    }
    let mut group = build_group(&root, resources)?;
    group.set_layout_params(layout_params(&root)?);
    Ok(group)
}

fn layout_params(node: &Node) -> Result<LayoutParams, ElementError> {
    let dimension = |length: &Option<Length>| {
        length
            .as_ref()
            .map_or(Ok(Dimension::WrapContent), Length::to_dimension)
    };
    let params = MarginLayoutParams::new(dimension(&node.width)?, dimension(&node.height)?)
        .with_margins(node.margins.unwrap_or_default());
    Ok(LayoutParams::Margin(params))
}

fn apply_common(element: &mut dyn Element, node: &Node) {
    if let Some(id) = node.id {
        element.set_id(Some(id));
    }
    if let Some(padding) = node.padding {
        element.set_padding(padding);
    }
}

fn build(node: &Node, resources: &Resources) -> Result<Box<dyn Element>, ElementError> {
    let mut element: Box<dyn Element> = if node.kind == "linear" {
        Box::new(build_group(node, resources)?)
    } else {
        match node.kind.parse::<ElementKind>()? {
            ElementKind::Image => Box::new(build_image(node, resources)?),
            ElementKind::Text => Box::new(build_text(node)?),
        }
    };
    element.set_layout_params(layout_params(node)?);
    Ok(element)
}

fn build_group(node: &Node, resources: &Resources) -> Result<LinearGroup, ElementError> {
    let orientation = match &node.orientation {
        Some(o) => o.parse::<Orientation>()?,
        None => Orientation::default(),
    };
    let mut group = LinearGroup::new(orientation);
    apply_common(&mut group, node);
    for child in &node.children {
        group.add_child(build(child, resources)?);
    }
    Ok(group)
}

fn build_image(node: &Node, resources: &Resources) -> Result<ImageElement, ElementError> {
    let mut image = ImageElement::new();
    apply_common(&mut image, node);
    if let Some(scale_type) = &node.scale_type {
        image.set_scale_type(scale_type.parse::<ScaleType>()?);
    }
    if let Some(name) = &node.src {
        match resources.resource_id(name) {
            Some(id) => image.set_image_resource(id),
            None => tracing::warn!(name = %name, "unknown drawable resource in layout"),
        }
    }
    Ok(image)
}

fn build_text(node: &Node) -> Result<TextElement, ElementError> {
    let mut text = TextElement::new();
    apply_common(&mut text, node);
    if let Some(size) = node.text_size.filter(|s| *s >= 0.0) {
        text.set_text_size(size);
    }
    if let Some(hex) = &node.text_color {
        match Color::from_hex(hex) {
            Some(color) => text.set_text_color(color),
            None => tracing::warn!(color = %hex, "unparseable text color in layout"),
        }
    }
    if let Some(max_lines) = node.max_lines.filter(|n| *n > 0) {
        text.set_max_lines(max_lines);
    }
    match node.ellipsize.as_deref() {
        None => {}
        Some("marquee") => tracing::warn!("marquee ellipsize is not supported"),
        Some(mode) => text.set_ellipsize(Some(mode.parse::<TruncateAt>()?)),
    }
    if let Some(content) = &node.text {
        text.set_text(content.as_str());
    }
    Ok(text)
}

// =========================================================================
// Tests
// =========================================================================
