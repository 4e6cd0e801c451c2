use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chat::models::Badge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmoteSource {
    Twitch,
    Cheer,
    SevenTv,
    Bttv,
    Ffz,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emote {
    pub name: String,
    pub url: String,
    pub source: EmoteSource,
    /// Drawn on top of the preceding emote instead of next to it.
    #[serde(default)]
    pub zero_width: bool,
}

impl Emote {
    pub fn new(name: impl Into<String>, url: impl Into<String>, source: EmoteSource) -> Self {
        Emote {
            name: name.into(),
            url: url.into(),
            source,
            zero_width: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchBadge {
    pub set_id: String,
    pub version: String,
    pub title: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheerTier {
    pub min_bits: u32,
    pub color: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheerEmote {
    pub prefix: String,
    pub tiers: Vec<CheerTier>,
}

impl CheerEmote {
    pub fn tier_for(&self, bits: u32) -> Option<&CheerTier> {
        self.tiers
            .iter()
            .filter(|t| t.min_bits <= bits)
            .max_by_key(|t| t.min_bits)
    }
}

/// Global and channel badge images, keyed by (set, version).
/// The channel catalog shadows the global one.
#[derive(Debug, Clone, Default)]
pub struct BadgeCatalog {
    global: HashMap<(String, String), TwitchBadge>,
    channel: HashMap<(String, String), TwitchBadge>,
}

impl BadgeCatalog {
    pub fn new(global: Vec<TwitchBadge>, channel: Vec<TwitchBadge>) -> Self {
        fn index(badges: Vec<TwitchBadge>) -> HashMap<(String, String), TwitchBadge> {
            badges
                .into_iter()
                .map(|b| ((b.set_id.clone(), b.version.clone()), b))
                .collect()
        }
        BadgeCatalog {
            global: index(global),
            channel: index(channel),
        }
    }

    pub fn lookup(&self, badge: &Badge) -> Option<&TwitchBadge> {
        let key = (badge.set_id.clone(), badge.version.clone());
        self.channel.get(&key).or_else(|| self.global.get(&key))
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.channel.is_empty()
    }
}
