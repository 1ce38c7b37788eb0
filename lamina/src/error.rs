//! Element error types.

use thiserror::Error;

use crate::resources::ResourceId;

#[derive(Debug, Error)]
pub enum ElementError {
    #[error("unknown element type: {0}")]
    UnknownElementType(String),

    #[error("unknown scale type: {0}")]
    UnknownScaleType(String),

    #[error("unknown ellipsis mode: {0}")]
    UnknownEllipsis(String),

    #[error("unknown orientation: {0}")]
    UnknownOrientation(String),

    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("layout root must be a group, found {0}")]
    RootNotGroup(String),

    #[error("malformed layout description: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("drawable resource not found: {0:?}")]
    NotFound(ResourceId),
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("empty image: {width}x{height}")]
    Empty { width: u32, height: u32 },
}
