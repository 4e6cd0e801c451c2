use async_trait::async_trait;

use crate::chat::errors::Result;
use crate::emotes::models::{CheerEmote, Emote, TwitchBadge};

#[async_trait]
pub trait EmoteProvider: Send + Sync {
    /// Stable key used for logging and for the process-wide cache.
    fn name(&self) -> &'static str;

    async fn global_emotes(&self) -> Result<Vec<Emote>>;

    async fn channel_emotes(&self, channel_id: &str) -> Result<Vec<Emote>>;
}

#[async_trait]
pub trait BadgeSource: Send + Sync {
    async fn global_badges(&self) -> Result<Vec<TwitchBadge>>;

    async fn channel_badges(&self, channel_id: &str) -> Result<Vec<TwitchBadge>>;
}

#[async_trait]
pub trait EmoteSetSource: Send + Sync {
    async fn emote_sets(&self, set_ids: &[String]) -> Result<Vec<Emote>>;
}

#[async_trait]
pub trait CheerSource: Send + Sync {
    async fn cheer_emotes(&self, channel_id: &str) -> Result<Vec<CheerEmote>>;
}
