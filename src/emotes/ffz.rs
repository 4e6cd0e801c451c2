use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::chat::errors::Result;
use crate::emotes::models::{Emote, EmoteSource};
use crate::emotes::sources::EmoteProvider;

// FFZ emotes are served through the BTTV cache, which normalizes their shape.
const API_URL: &str = "https://api.betterttv.net/3/cached/frankerfacez";

#[derive(Debug, Deserialize)]
struct FfzEmote {
    code: String,
    #[serde(default)]
    images: HashMap<String, Option<String>>,
}

impl FfzEmote {
    fn into_emote(mut self) -> Option<Emote> {
        let url = ["2x", "1x"]
            .iter()
            .find_map(|size| self.images.remove(*size).flatten())?;
        Some(Emote::new(self.code, url, EmoteSource::Ffz))
    }
}

pub struct FfzProvider {
    client: Client,
}

impl FfzProvider {
    pub fn new(client: Client) -> Self {
        FfzProvider { client }
    }

    async fn fetch(&self, url: String) -> Result<Vec<Emote>> {
        let emotes: Vec<FfzEmote> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(emotes.into_iter().filter_map(FfzEmote::into_emote).collect())
    }
}

#[async_trait]
impl EmoteProvider for FfzProvider {
    fn name(&self) -> &'static str {
        "ffz"
    }

    async fn global_emotes(&self) -> Result<Vec<Emote>> {
        self.fetch(format!("{}/emotes/global", API_URL)).await
    }

    async fn channel_emotes(&self, channel_id: &str) -> Result<Vec<Emote>> {
        self.fetch(format!("{}/users/twitch/{}", API_URL, channel_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_2x_image_and_falls_back_to_1x() {
        let json = r#"[
            {"id": 1, "code": "LULW", "images": {"1x": "https://cdn.ffz/1/1", "2x": "https://cdn.ffz/1/2", "4x": null}},
            {"id": 2, "code": "Pog", "images": {"1x": "https://cdn.ffz/2/1", "2x": null, "4x": null}},
            {"id": 3, "code": "Broken", "images": {}}
        ]"#;
        let emotes: Vec<Emote> = serde_json::from_str::<Vec<FfzEmote>>(json)
            .unwrap()
            .into_iter()
            .filter_map(FfzEmote::into_emote)
            .collect();

        assert_eq!(emotes.len(), 2);
        assert_eq!(emotes[0].url, "https://cdn.ffz/1/2");
        assert_eq!(emotes[1].url, "https://cdn.ffz/2/1");
        assert_eq!(emotes[1].source, EmoteSource::Ffz);
    }
}
