pub mod aggregator;
pub mod bttv;
pub mod cache;
pub mod catalog;
pub mod ffz;
pub mod models;
pub mod seventv;
pub mod sources;

pub use aggregator::EmoteAggregator;
pub use cache::GlobalCache;
pub use catalog::EmoteCatalog;
pub use models::{BadgeCatalog, CheerEmote, CheerTier, Emote, EmoteSource, TwitchBadge};
pub use sources::{BadgeSource, CheerSource, EmoteProvider, EmoteSetSource};
