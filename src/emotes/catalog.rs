use std::collections::HashMap;

use parking_lot::RwLock;

use crate::chat::models::Badge;
use crate::emotes::models::{BadgeCatalog, CheerEmote, Emote, TwitchBadge};

#[derive(Default)]
struct Layers {
    platform: Vec<Emote>,
    global: Vec<Emote>,
    channel: Vec<Emote>,
    merged: HashMap<String, Emote>,
    badges: BadgeCatalog,
    cheer: Vec<CheerEmote>,
}

impl Layers {
    /// Later layers win on a trigger collision: platform sets, then global
    /// third-party emotes, then channel third-party emotes.
    fn rebuild(&mut self) {
        let mut merged = HashMap::with_capacity(self.platform.len() + self.global.len() + self.channel.len());
        for emote in self.platform.iter().chain(&self.global).chain(&self.channel) {
            merged.insert(emote.name.clone(), emote.clone());
        }
        self.merged = merged;
    }
}

#[derive(Default)]
pub struct EmoteCatalog {
    layers: RwLock<Layers>,
}

impl EmoteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, trigger: &str) -> Option<Emote> {
        self.layers.read().merged.get(trigger).cloned()
    }

    pub fn contains(&self, trigger: &str) -> bool {
        self.layers.read().merged.contains_key(trigger)
    }

    pub fn len(&self) -> usize {
        self.layers.read().merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn platform_emotes(&self) -> Vec<Emote> {
        self.layers.read().platform.clone()
    }

    pub fn third_party_emotes(&self) -> Vec<Emote> {
        let layers = self.layers.read();
        layers.channel.iter().chain(&layers.global).cloned().collect()
    }

    pub fn set_platform_emotes(&self, emotes: Vec<Emote>) {
        let mut layers = self.layers.write();
        layers.platform = emotes;
        layers.rebuild();
    }

    pub fn set_third_party_emotes(&self, global: Vec<Emote>, channel: Vec<Emote>) {
        let mut layers = self.layers.write();
        layers.global = global;
        layers.channel = channel;
        layers.rebuild();
    }

    pub fn set_badges(&self, badges: BadgeCatalog) {
        self.layers.write().badges = badges;
    }

    pub fn badge(&self, badge: &Badge) -> Option<TwitchBadge> {
        self.layers.read().badges.lookup(badge).cloned()
    }

    pub fn set_cheer_emotes(&self, cheer: Vec<CheerEmote>) {
        self.layers.write().cheer = cheer;
    }

    pub fn cheer_emotes(&self) -> Vec<CheerEmote> {
        self.layers.read().cheer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotes::models::EmoteSource;

    #[test]
    fn channel_emotes_win_over_global_and_platform() {
        let catalog = EmoteCatalog::new();
        catalog.set_platform_emotes(vec![Emote::new("Kappa", "twitch", EmoteSource::Twitch)]);
        catalog.set_third_party_emotes(
            vec![Emote::new("Kappa", "global-7tv", EmoteSource::SevenTv), Emote::new("OMEGALUL", "g", EmoteSource::Bttv)],
            vec![Emote::new("Kappa", "channel-bttv", EmoteSource::Bttv)],
        );
        assert_eq!(catalog.get("Kappa").unwrap().url, "channel-bttv");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.platform_emotes()[0].url, "twitch");
        let third_party: Vec<String> = catalog.third_party_emotes().into_iter().map(|e| e.url).collect();
        assert_eq!(third_party, vec!["channel-bttv", "global-7tv", "g"]);

        catalog.set_third_party_emotes(vec![Emote::new("Kappa", "global-7tv", EmoteSource::SevenTv)], Vec::new());
        assert_eq!(catalog.get("Kappa").unwrap().url, "global-7tv");
    }

    #[test]
    fn triggers_are_case_sensitive() {
        let catalog = EmoteCatalog::new();
        catalog.set_platform_emotes(vec![Emote::new("Kappa", "u", EmoteSource::Twitch)]);
        assert!(catalog.contains("Kappa"));
        assert!(!catalog.contains("kappa"));
    }
}
