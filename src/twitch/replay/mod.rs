pub mod buffer;
pub mod manager;
pub mod models;

use async_trait::async_trait;

use crate::chat::errors::Result;

pub use buffer::ReplayBuffer;
pub use manager::{ReplayController, ReplayTimeline};
pub use models::{ChatLogPage, PageRequest, ReplayComment};

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[async_trait]
pub trait ChatLogFetcher: Send + Sync {
    async fn fetch_by_offset(&self, video_id: &str, offset_seconds: f64, page_size: usize) -> Result<ChatLogPage>;

    async fn fetch_by_cursor(&self, video_id: &str, cursor: &str, page_size: usize) -> Result<ChatLogPage>;
}

/// Current position of the video player, in seconds.
pub trait PlaybackClock: Send + Sync {
    fn position(&self) -> f64;
}

impl<F> PlaybackClock for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn position(&self) -> f64 {
        self()
    }
}
