//! Image fetching glue.
//!
//! An [`ImageLoader`] fetches images somewhere else and completes an
//! [`ImageTarget`] from any thread. The row keeps the matching
//! [`PendingImage`] and applies the delivery on its own thread the next
//! time it polls.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use lamina::{Bitmap, BitmapDrawable, Drawable, FadeDrawable, ImageElement};

/// Where a delivered image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadedFrom {
    Memory,
    Disk,
    Network,
}

/// Outcome of one fetch.
#[derive(Debug)]
pub enum ImageDelivery {
    Loaded(Bitmap, LoadedFrom),
    Failed,
}

/// Fetches images for rows.
pub trait ImageLoader: Send + Sync {
    /// Start fetching `url`. The target may be completed synchronously or
    /// later from another thread. Dropping it counts as a failure.
    fn load(&self, url: &str, target: ImageTarget);
}

/// Completion side of a fetch.
#[derive(Debug)]
pub struct ImageTarget {
    url: String,
    sender: oneshot::Sender<ImageDelivery>,
}

impl ImageTarget {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn deliver(self, bitmap: Bitmap, from: LoadedFrom) {
        // The row may have been dropped or rebound meanwhile.
        let _ = self.sender.send(ImageDelivery::Loaded(bitmap, from));
    }

    pub fn fail(self) {
        tracing::debug!(url = %self.url, "image fetch failed");
        let _ = self.sender.send(ImageDelivery::Failed);
    }
}

/// Receiving side of a fetch.
#[derive(Debug)]
pub struct PendingImage {
    receiver: oneshot::Receiver<ImageDelivery>,
}

impl PendingImage {
    /// The delivery, if one has arrived. A target dropped without
    /// completing yields [`ImageDelivery::Failed`].
    pub fn try_take(&mut self) -> Option<ImageDelivery> {
        match self.receiver.try_recv() {
            Ok(delivery) => Some(delivery),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(ImageDelivery::Failed),
        }
    }
}

/// A connected target/pending pair for `url`.
pub fn image_request(url: &str) -> (ImageTarget, PendingImage) {
    let (sender, receiver) = oneshot::channel();
    (
        ImageTarget {
            url: url.to_string(),
            sender,
        },
        PendingImage { receiver },
    )
}

/// Cross-fade length for images that did not come from memory.
pub const IMAGE_FADE: Duration = Duration::from_millis(200);

/// Show a delivery on `element`. Images from memory replace the drawable
/// outright; others fade in from `placeholder`. Failures show the
/// placeholder.
pub fn apply_delivery(
    element: &mut ImageElement,
    delivery: ImageDelivery,
    placeholder: Option<Box<dyn Drawable>>,
) {
    match delivery {
        ImageDelivery::Loaded(bitmap, LoadedFrom::Memory) => element.set_image_bitmap(bitmap),
        ImageDelivery::Loaded(bitmap, _) => {
            let mut fade = FadeDrawable::new(placeholder, Box::new(BitmapDrawable::new(bitmap)))
                .with_duration(IMAGE_FADE);
            fade.start();
            element.set_image_drawable(Some(Box::new(fade)));
        }
        ImageDelivery::Failed => element.set_image_drawable(placeholder),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use lamina::{Color, ColorDrawable};

    fn bitmap() -> Bitmap {
        Bitmap::new(RgbaImage::new(4, 2))
    }

    fn placeholder() -> Option<Box<dyn Drawable>> {
        Some(Box::new(ColorDrawable::new(Color::WHITE)))
    }

    #[test]
    fn test_pending_until_delivered() {
        let (target, mut pending) = image_request("a");
        assert_eq!(target.url(), "a");
        assert!(pending.try_take().is_none());
        target.deliver(bitmap(), LoadedFrom::Disk);
        assert!(matches!(
            pending.try_take(),
            Some(ImageDelivery::Loaded(_, LoadedFrom::Disk))
        ));
    }

    #[test]
    fn test_dropped_target_fails() {
        let (target, mut pending) = image_request("a");
        drop(target);
        assert!(matches!(pending.try_take(), Some(ImageDelivery::Failed)));
    }

    #[test]
    fn test_memory_delivery_sets_bitmap() {
        let mut element = ImageElement::new();
        apply_delivery(&mut element, ImageDelivery::Loaded(bitmap(), LoadedFrom::Memory), placeholder());
        assert_eq!(element.drawable_size(), (4, 2));
        assert!(!element.drawable().unwrap().is_running());
    }

    #[test]
    fn test_network_delivery_fades() {
        let mut element = ImageElement::new();
        apply_delivery(&mut element, ImageDelivery::Loaded(bitmap(), LoadedFrom::Network), placeholder());
        assert!(element.drawable().unwrap().is_running());
        assert_eq!(element.drawable_size(), (4, 2));
    }

    #[test]
    fn test_failure_shows_placeholder() {
        let mut element = ImageElement::new();
        apply_delivery(&mut element, ImageDelivery::Failed, placeholder());
        assert!(element.drawable().is_some());
        assert_eq!(element.drawable_size(), (-1, -1));
    }
}
