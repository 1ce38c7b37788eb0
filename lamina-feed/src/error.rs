//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to start preload workers: {0}")]
    PoolStart(#[from] std::io::Error),
}
