use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};

use crate::chat::errors::Result;
use crate::config::Config;
use crate::emotes::bttv::BttvProvider;
use crate::emotes::cache::GlobalCache;
use crate::emotes::catalog::EmoteCatalog;
use crate::emotes::ffz::FfzProvider;
use crate::emotes::models::{BadgeCatalog, CheerEmote, Emote};
use crate::emotes::seventv::SevenTvProvider;
use crate::emotes::sources::{BadgeSource, CheerSource, EmoteProvider, EmoteSetSource};
use crate::twitch::api::HelixClient;

pub const EMOTE_SET_CHUNK: usize = 25;

/// A failing source contributes nothing; the remaining sources still load.
pub struct EmoteAggregator {
    badges: Option<Arc<dyn BadgeSource>>,
    providers: Vec<Arc<dyn EmoteProvider>>,
    emote_sets: Option<Arc<dyn EmoteSetSource>>,
    cheers: Option<Arc<dyn CheerSource>>,
    cache: Arc<GlobalCache>,
}

impl Default for EmoteAggregator {
    fn default() -> Self {
        EmoteAggregator::new(GlobalCache::shared())
    }
}

impl EmoteAggregator {
    pub fn new(cache: Arc<GlobalCache>) -> Self {
        EmoteAggregator {
            badges: None,
            providers: Vec::new(),
            emote_sets: None,
            cheers: None,
            cache,
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut aggregator = EmoteAggregator::default()
            .with_provider(Arc::new(SevenTvProvider::new(client.clone())))
            .with_provider(Arc::new(BttvProvider::new(client.clone())))
            .with_provider(Arc::new(FfzProvider::new(client.clone())));

        match HelixClient::from_config(config, client) {
            Some(helix) => {
                let helix = Arc::new(helix);
                aggregator = aggregator
                    .with_badges(helix.clone())
                    .with_emote_sets(helix.clone())
                    .with_cheers(helix);
            }
            None => info!("Helix credentials not configured, skipping badges, emote sets and cheermotes"),
        }
        aggregator
    }

    pub fn with_provider(mut self, provider: Arc<dyn EmoteProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_badges(mut self, source: Arc<dyn BadgeSource>) -> Self {
        self.badges = Some(source);
        self
    }

    pub fn with_emote_sets(mut self, source: Arc<dyn EmoteSetSource>) -> Self {
        self.emote_sets = Some(source);
        self
    }

    pub fn with_cheers(mut self, source: Arc<dyn CheerSource>) -> Self {
        self.cheers = Some(source);
        self
    }

    pub async fn load_channel(&self, channel_id: &str, catalog: &EmoteCatalog) {
        let (badges, cheers, emotes) = tokio::join!(
            self.load_badges(channel_id),
            self.load_cheers(channel_id),
            self.load_third_party(channel_id),
        );
        catalog.set_badges(badges);
        catalog.set_cheer_emotes(cheers);
        let (global, channel) = emotes;
        info!(
            "Loaded {} global and {} channel emotes for channel {}",
            global.len(),
            channel.len(),
            channel_id
        );
        catalog.set_third_party_emotes(global, channel);
    }

    pub async fn load_emote_sets(&self, set_ids: &[String]) -> Vec<Emote> {
        let Some(source) = &self.emote_sets else {
            return Vec::new();
        };
        let mut ids: Vec<String> = set_ids.to_vec();
        ids.reverse();

        let mut emotes = Vec::new();
        for chunk in ids.chunks(EMOTE_SET_CHUNK) {
            match source.emote_sets(chunk).await {
                Ok(batch) => emotes.extend(batch),
                Err(e) => warn!("Failed to load {} emote sets: {}", chunk.len(), e),
            }
        }
        debug!("Loaded {} emotes from {} emote sets", emotes.len(), set_ids.len());
        emotes
    }

    async fn load_badges(&self, channel_id: &str) -> BadgeCatalog {
        let Some(source) = &self.badges else {
            return BadgeCatalog::default();
        };
        let (global, channel) = tokio::join!(
            self.cache.global_badges(|| source.global_badges()),
            source.channel_badges(channel_id),
        );
        BadgeCatalog::new(or_empty("global badges", global), or_empty("channel badges", channel))
    }

    async fn load_cheers(&self, channel_id: &str) -> Vec<CheerEmote> {
        match &self.cheers {
            Some(source) => or_empty("cheer emotes", source.cheer_emotes(channel_id).await),
            None => Vec::new(),
        }
    }

    async fn load_third_party(&self, channel_id: &str) -> (Vec<Emote>, Vec<Emote>) {
        let globals = join_all(self.providers.iter().map(|provider| async move {
            let result = self
                .cache
                .global_emotes(provider.name(), || provider.global_emotes())
                .await;
            or_empty(provider.name(), result)
        }));
        let channels = join_all(self.providers.iter().map(|provider| async move {
            or_empty(provider.name(), provider.channel_emotes(channel_id).await)
        }));
        let (globals, channels) = tokio::join!(globals, channels);
        (globals.concat(), channels.concat())
    }
}

fn or_empty<T>(what: &str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("Failed to load {}: {}", what, e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::errors::ChatError;
    use crate::emotes::models::{EmoteSource, TwitchBadge};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        name: &'static str,
        global: Vec<Emote>,
        channel: Vec<Emote>,
        fail: bool,
        global_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(name: &'static str, global: &[&str], channel: &[&str]) -> Self {
            let emotes = |names: &[&str], scope: &str| {
                names
                    .iter()
                    .map(|n| Emote::new(*n, format!("{}-{}", name, scope), EmoteSource::SevenTv))
                    .collect()
            };
            FakeProvider {
                name,
                global: emotes(global, "global"),
                channel: emotes(channel, "channel"),
                fail: false,
                global_calls: AtomicUsize::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            FakeProvider { fail: true, ..FakeProvider::new(name, &[], &[]) }
        }
    }

    #[async_trait]
    impl EmoteProvider for FakeProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn global_emotes(&self) -> Result<Vec<Emote>> {
            self.global_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ChatError::InvalidResponse("down".into()));
            }
            Ok(self.global.clone())
        }

        async fn channel_emotes(&self, _channel_id: &str) -> Result<Vec<Emote>> {
            if self.fail {
                return Err(ChatError::InvalidResponse("down".into()));
            }
            Ok(self.channel.clone())
        }
    }

    #[derive(Default)]
    struct FakeSets {
        requests: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl EmoteSetSource for FakeSets {
        async fn emote_sets(&self, set_ids: &[String]) -> Result<Vec<Emote>> {
            self.requests.lock().push(set_ids.to_vec());
            if set_ids.iter().any(|id| id == "bad") {
                return Err(ChatError::InvalidResponse("bad set".into()));
            }
            Ok(set_ids
                .iter()
                .map(|id| Emote::new(format!("emote{}", id), id.clone(), EmoteSource::Twitch))
                .collect())
        }
    }

    struct FakeBadges {
        fail: bool,
    }

    #[async_trait]
    impl BadgeSource for FakeBadges {
        async fn global_badges(&self) -> Result<Vec<TwitchBadge>> {
            Ok(Vec::new())
        }

        async fn channel_badges(&self, _channel_id: &str) -> Result<Vec<TwitchBadge>> {
            if self.fail {
                return Err(ChatError::InvalidResponse("no badges".into()));
            }
            Ok(vec![TwitchBadge {
                set_id: "subscriber".into(),
                version: "0".into(),
                title: None,
                url: "sub".into(),
            }])
        }
    }

    struct FakeCheers;

    #[async_trait]
    impl CheerSource for FakeCheers {
        async fn cheer_emotes(&self, _channel_id: &str) -> Result<Vec<CheerEmote>> {
            Ok(vec![CheerEmote { prefix: "Cheer".into(), tiers: Vec::new() }])
        }
    }

    fn provider(name: &'static str, failing: &str, global: &[&str], channel: &[&str]) -> Arc<FakeProvider> {
        if name == failing {
            Arc::new(FakeProvider::failing(name))
        } else {
            Arc::new(FakeProvider::new(name, global, channel))
        }
    }

    #[tokio::test]
    async fn one_failing_source_leaves_the_others_loaded() {
        for failing in ["7tv", "bttv", "ffz", "badges"] {
            let catalog = EmoteCatalog::new();
            let aggregator = EmoteAggregator::new(Arc::new(GlobalCache::default()))
                .with_provider(provider("7tv", failing, &["EZ"], &["Clap"]))
                .with_provider(provider("bttv", failing, &["OMEGALUL"], &["catJAM"]))
                .with_provider(provider("ffz", failing, &["LULW"], &["monkaS"]))
                .with_badges(Arc::new(FakeBadges { fail: failing == "badges" }))
                .with_cheers(Arc::new(FakeCheers));

            aggregator.load_channel("1", &catalog).await;

            let loaded = [("7tv", ["EZ", "Clap"]), ("bttv", ["OMEGALUL", "catJAM"]), ("ffz", ["LULW", "monkaS"])];
            for (source, triggers) in loaded {
                for trigger in triggers {
                    assert_eq!(catalog.contains(trigger), source != failing, "{} with {} failing", trigger, failing);
                }
            }
            let badge = catalog.badge(&crate::chat::models::Badge::new("subscriber", "0"));
            assert_eq!(badge.is_some(), failing != "badges");
            assert_eq!(catalog.cheer_emotes().len(), 1);
        }
    }

    #[tokio::test]
    async fn global_emotes_are_fetched_once_per_cache() {
        let cache = Arc::new(GlobalCache::default());
        let provider = Arc::new(FakeProvider::new("up", &["EZ"], &[]));
        let aggregator = EmoteAggregator::new(cache.clone()).with_provider(provider.clone());

        aggregator.load_channel("1", &EmoteCatalog::new()).await;
        aggregator.load_channel("2", &EmoteCatalog::new()).await;

        assert_eq!(provider.global_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_global_fetch_is_retried() {
        let provider = Arc::new(FakeProvider::failing("down"));
        let aggregator = EmoteAggregator::new(Arc::new(GlobalCache::default())).with_provider(provider.clone());

        aggregator.load_channel("1", &EmoteCatalog::new()).await;
        aggregator.load_channel("1", &EmoteCatalog::new()).await;

        assert_eq!(provider.global_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn emote_sets_are_reversed_and_chunked() {
        let sets = Arc::new(FakeSets::default());
        let aggregator = EmoteAggregator::new(Arc::new(GlobalCache::default())).with_emote_sets(sets.clone());
        let ids: Vec<String> = (0..30).map(|i| i.to_string()).collect();

        let emotes = aggregator.load_emote_sets(&ids).await;

        let requests = sets.requests.lock().clone();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].len(), EMOTE_SET_CHUNK);
        assert_eq!(requests[0][0], "29");
        assert_eq!(requests[1].len(), 5);
        assert_eq!(emotes.len(), 30);
    }

    #[tokio::test]
    async fn failed_emote_set_chunk_is_skipped() {
        let sets = Arc::new(FakeSets::default());
        let aggregator = EmoteAggregator::new(Arc::new(GlobalCache::default())).with_emote_sets(sets);
        let mut ids: Vec<String> = (0..25).map(|i| i.to_string()).collect();
        ids.insert(0, "bad".into());

        // reversed: "24".."0" in the first chunk, "bad" alone in the second
        let emotes = aggregator.load_emote_sets(&ids).await;
        assert_eq!(emotes.len(), 25);
    }
}
