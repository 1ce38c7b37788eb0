//! Feed rows on top of lamina.
//!
//! A feed row is a fixed composition of a profile image, author and message
//! text, an optional post image and action icons. Rows are built, measured
//! and laid out ahead of time by an [`AsyncRowFactory`], on worker threads
//! through a [`PreloadPool`], and kept in an [`ElementCache`] until a list
//! cell shows them through an [`AsyncRowView`].
//!
//! ```ignore
//! let config = FeedConfig::default();
//! let factory = Arc::new(AsyncRowFactory::new(&config, Arc::new(feed_resources(&config.metrics))));
//! let list = FeedList::new(items, PreloadPool::new(factory, &config)?, &config);
//! list.on_layout(surface_width);
//! list.on_scroll(first_visible, visible_count);
//! list.bind(position, &mut row_view, UpdateFlags::NONE);
//! ```

pub mod async_row;
pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod images;
pub mod item;
pub mod list;
pub mod preload;
pub mod row;

pub mod testing;

pub use async_row::{lock_row, AsyncRowElement, AsyncRowView, BuildOrigin, SharedRow};
pub use cache::ElementCache;
pub use config::{FeedConfig, RowMetrics};
pub use error::FeedError;
pub use factory::AsyncRowFactory;
pub use images::{ImageDelivery, ImageLoader, ImageTarget, LoadedFrom, PendingImage};
pub use item::{Action, FeedItem, ItemId, RowPresenter, UpdateFlags};
pub use list::FeedList;
pub use preload::PreloadPool;
pub use row::{feed_resources, register_row_drawables, RowElement};
