use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::chat::errors::Result;
use crate::emotes::models::{Emote, TwitchBadge};

lazy_static! {
    static ref PROCESS_CACHE: Arc<GlobalCache> = Arc::new(GlobalCache::default());
}

/// Global-scope emote and badge catalogs, fetched once and reused by every
/// channel session. A failed fetch leaves the cell empty so the next session retries.
#[derive(Default)]
pub struct GlobalCache {
    badges: OnceCell<Vec<TwitchBadge>>,
    emotes: Mutex<HashMap<&'static str, Arc<OnceCell<Vec<Emote>>>>>,
}

impl GlobalCache {
    pub fn shared() -> Arc<GlobalCache> {
        Arc::clone(&PROCESS_CACHE)
    }

    pub async fn global_badges<F, Fut>(&self, fetch: F) -> Result<Vec<TwitchBadge>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<TwitchBadge>>>,
    {
        self.badges.get_or_try_init(fetch).await.cloned()
    }

    pub async fn global_emotes<F, Fut>(&self, provider: &'static str, fetch: F) -> Result<Vec<Emote>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Emote>>>,
    {
        let cell = self.emotes.lock().entry(provider).or_default().clone();
        cell.get_or_try_init(fetch).await.cloned()
    }
}
