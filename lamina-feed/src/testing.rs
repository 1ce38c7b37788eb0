//! Test doubles for the feed layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use image::RgbaImage;
use lamina::testing::RecordingSurface;
use lamina::Bitmap;

use crate::config::RowMetrics;
use crate::images::{ImageLoader, ImageTarget, LoadedFrom};
use crate::item::{FeedItem, ItemId};
use crate::row::feed_resources;

/// Completes every fetch immediately from a fixed set of images. Unknown
/// URLs fail.
pub struct StaticImageLoader {
    images: HashMap<String, Bitmap>,
    from: LoadedFrom,
    requests: Mutex<Vec<String>>,
}

impl StaticImageLoader {
    pub fn new(from: LoadedFrom) -> Self {
        Self {
            images: HashMap::new(),
            from,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve a blank `width` x `height` image for `url`.
    pub fn with_image(mut self, url: &str, width: u32, height: u32) -> Self {
        self.images
            .insert(url.to_string(), Bitmap::new(RgbaImage::new(width, height)));
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ImageLoader for StaticImageLoader {
    fn load(&self, url: &str, target: ImageTarget) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        match self.images.get(url) {
            Some(bitmap) => target.deliver(bitmap.clone(), self.from),
            None => target.fail(),
        }
    }
}

/// A recording surface whose resources include the row drawables.
pub fn row_surface(metrics: &RowMetrics) -> Arc<RecordingSurface> {
    RecordingSurface::with_resources(feed_resources(metrics))
}

/// `count` items with ids starting at `first`; every other one has a post
/// image.
pub fn sample_items(first: ItemId, count: usize) -> Vec<FeedItem> {
    (0..count as u64)
        .map(|i| {
            let id = first + i;
            let item = FeedItem::new(id, format!("author {id}"), format!("message number {id}"), format!("profile/{id}"));
            if i % 2 == 1 {
                item.with_post_image(format!("post/{id}"))
            } else {
                item
            }
        })
        .collect()
}
