//! Row metrics and feed configuration.

use serde::Deserialize;

use lamina::Color;

use crate::error::FeedError;

/// Pixel metrics and colors of a feed row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RowMetrics {
    /// Padding on every side of the row.
    pub padding: i32,
    pub profile_image_size: i32,
    pub post_image_height: i32,
    pub icon_size: i32,
    /// Horizontal gap between action icons.
    pub icon_margin: i32,
    /// Gap between the profile image and the content column, and between
    /// blocks inside the column.
    pub content_margin: i32,
    pub author_text_size: f32,
    pub message_text_size: f32,
    pub author_text_color: String,
    pub message_text_color: String,
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self {
            padding: 8,
            profile_image_size: 48,
            post_image_height: 160,
            icon_size: 16,
            icon_margin: 12,
            content_margin: 8,
            author_text_size: 14.0,
            message_text_size: 13.0,
            author_text_color: "#333333".to_string(),
            message_text_color: "#666666".to_string(),
        }
    }
}

impl RowMetrics {
    pub fn author_color(&self) -> Color {
        parse_color(&self.author_text_color)
    }

    pub fn message_color(&self) -> Color {
        parse_color(&self.message_text_color)
    }
}

fn parse_color(hex: &str) -> Color {
    Color::from_hex(hex).unwrap_or_else(|| {
        tracing::warn!(color = %hex, "unparseable row color, using black");
        Color::BLACK
    })
}

/// Everything the feed layer needs to know up front.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub cache_capacity: usize,
    /// Rows to build ahead of the visible range, in each direction.
    pub preload_count: usize,
    pub worker_threads: usize,
    pub metrics: RowMetrics,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 30,
            preload_count: 30,
            worker_threads: 1,
            metrics: RowMetrics::default(),
        }
    }
}

impl FeedConfig {
    pub const MAX_WORKERS: usize = 2;

    pub fn from_json(json: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Background workers to run, between one and [`Self::MAX_WORKERS`].
    pub fn workers(&self) -> usize {
        self.worker_threads.clamp(1, Self::MAX_WORKERS)
    }
}

// =========================================================================
// Tests
// =========================================================================
