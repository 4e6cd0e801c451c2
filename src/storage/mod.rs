pub mod client;
pub mod models;

use async_trait::async_trait;
use tokio_stream::wrappers::WatchStream;

use crate::chat::errors::Result;

pub use client::StorageClient;
pub use models::RecentEmote;

#[async_trait]
pub trait RecentEmoteStore: Send + Sync {
    async fn insert(&self, emotes: Vec<RecentEmote>) -> Result<()>;

    fn load_recent(&self) -> WatchStream<Vec<RecentEmote>>;

    fn recent(&self) -> Vec<RecentEmote>;
}
