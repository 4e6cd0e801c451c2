use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::chat::errors::Result;
use crate::emotes::models::{Emote, EmoteSource};
use crate::emotes::sources::EmoteProvider;

const API_URL: &str = "https://7tv.io/v3";

const ACTIVE_FLAG_ZERO_WIDTH: u32 = 1;
const EMOTE_FLAG_ZERO_WIDTH: u32 = 1 << 8;

#[derive(Debug, Deserialize)]
struct EmoteSet {
    #[serde(default)]
    emotes: Vec<ActiveEmote>,
}

#[derive(Debug, Deserialize)]
struct UserConnection {
    emote_set: Option<EmoteSet>,
}

#[derive(Debug, Deserialize)]
struct ActiveEmote {
    name: String,
    #[serde(default)]
    flags: u32,
    data: Option<EmoteData>,
}

#[derive(Debug, Deserialize)]
struct EmoteData {
    #[serde(default)]
    flags: u32,
    host: EmoteHost,
}

#[derive(Debug, Deserialize)]
struct EmoteHost {
    url: String,
}

impl EmoteSet {
    fn into_emotes(self) -> Vec<Emote> {
        self.emotes
            .into_iter()
            .filter_map(|active| {
                let data = active.data?;
                let mut emote = Emote::new(active.name, format!("https:{}/2x.webp", data.host.url), EmoteSource::SevenTv);
                emote.zero_width =
                    active.flags & ACTIVE_FLAG_ZERO_WIDTH != 0 || data.flags & EMOTE_FLAG_ZERO_WIDTH != 0;
                Some(emote)
            })
            .collect()
    }
}

pub struct SevenTvProvider {
    client: Client,
}

impl SevenTvProvider {
    pub fn new(client: Client) -> Self {
        SevenTvProvider { client }
    }
}

#[async_trait]
impl EmoteProvider for SevenTvProvider {
    fn name(&self) -> &'static str {
        "7tv"
    }

    async fn global_emotes(&self) -> Result<Vec<Emote>> {
        let set: EmoteSet = self
            .client
            .get(format!("{}/emote-sets/global", API_URL))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(set.into_emotes())
    }

    async fn channel_emotes(&self, channel_id: &str) -> Result<Vec<Emote>> {
        let user: UserConnection = self
            .client
            .get(format!("{}/users/twitch/{}", API_URL, channel_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let emotes = user.emote_set.map(EmoteSet::into_emotes).unwrap_or_default();
        debug!("7TV returned {} emotes for channel {}", emotes.len(), channel_id);
        Ok(emotes)
    }
}
