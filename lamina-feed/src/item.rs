//! Feed items and the presenter contract rows implement.

use serde::Deserialize;

use crate::error::FeedError;

/// Stable identity of a feed item.
pub type ItemId = u64;

/// One post in the feed, as supplied by the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: ItemId,
    pub author_name: String,
    pub message: String,
    pub profile_image_url: String,
    #[serde(default)]
    pub post_image_url: Option<String>,
}

impl FeedItem {
    pub fn new(
        id: ItemId,
        author_name: impl Into<String>,
        message: impl Into<String>,
        profile_image_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            author_name: author_name.into(),
            message: message.into(),
            profile_image_url: profile_image_url.into(),
            post_image_url: None,
        }
    }

    pub fn with_post_image(mut self, url: impl Into<String>) -> Self {
        self.post_image_url = Some(url.into());
        self
    }

    /// The post image URL, if present and non-empty.
    pub fn post_image(&self) -> Option<&str> {
        self.post_image_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn has_post_image(&self) -> bool {
        self.post_image().is_some()
    }

    /// Parse a JSON array of items.
    pub fn list_from_json(json: &str) -> Result<Vec<FeedItem>, FeedError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Action icons shown under every row, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Reply,
    Repost,
    Favourite,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Reply, Action::Repost, Action::Favourite];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Options for a row update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct UpdateFlags {
    no_image_loading: bool,
}

impl UpdateFlags {
    pub const NONE: Self = Self {
        no_image_loading: false,
    };

    /// Show placeholders instead of fetching images.
    pub const NO_IMAGE_LOADING: Self = Self {
        no_image_loading: true,
    };

    pub fn loads_images(self) -> bool {
        !self.no_image_loading
    }
}

/// Something that shows a feed item.
pub trait RowPresenter {
    fn update(&mut self, item: &FeedItem, flags: UpdateFlags);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items() {
        let json = r#"[
            { "id": 1, "authorName": "A", "message": "hello", "profileImageUrl": "p" },
            { "id": 2, "authorName": "B", "message": "hi", "profileImageUrl": "p", "postImageUrl": "q" },
            { "id": 3, "authorName": "C", "message": "yo", "profileImageUrl": "p", "postImageUrl": "" }
        ]"#;
        let items = FeedItem::list_from_json(json).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], FeedItem::new(1, "A", "hello", "p"));
        assert_eq!(items[1].post_image(), Some("q"));
        assert!(!items[2].has_post_image());
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let json = r#"[{ "id": 1, "message": "hello" }]"#;
        assert!(matches!(FeedItem::list_from_json(json), Err(FeedError::Json(_))));
    }

    #[test]
    fn test_flags() {
        assert!(UpdateFlags::NONE.loads_images());
        assert!(!UpdateFlags::NO_IMAGE_LOADING.loads_images());
        assert_eq!(UpdateFlags::default(), UpdateFlags::NONE);
    }
}
