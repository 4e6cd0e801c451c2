use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::chat::errors::Result;
use crate::emotes::models::{Emote, EmoteSource};
use crate::emotes::sources::EmoteProvider;

const API_URL: &str = "https://api.betterttv.net/3/cached";
const CDN_URL: &str = "https://cdn.betterttv.net/emote";

/// Global BTTV emotes rendered on top of the previous emote.
const ZERO_WIDTH: &[&str] = &[
    "SoSnowy", "IceCold", "SantaHat", "TopHat", "ReinDeer", "CandyCane", "cvMask", "cvHazmat",
];

#[derive(Debug, Deserialize)]
pub(crate) struct BttvEmote {
    id: String,
    code: String,
}

impl From<BttvEmote> for Emote {
    fn from(emote: BttvEmote) -> Self {
        let mut converted = Emote::new(emote.code, format!("{}/{}/2x", CDN_URL, emote.id), EmoteSource::Bttv);
        converted.zero_width = ZERO_WIDTH.contains(&converted.name.as_str());
        converted
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BttvChannel {
    #[serde(default)]
    channel_emotes: Vec<BttvEmote>,
    #[serde(default)]
    shared_emotes: Vec<BttvEmote>,
}

pub struct BttvProvider {
    client: Client,
}

impl BttvProvider {
    pub fn new(client: Client) -> Self {
        BttvProvider { client }
    }
}

#[async_trait]
impl EmoteProvider for BttvProvider {
    fn name(&self) -> &'static str {
        "bttv"
    }

    async fn global_emotes(&self) -> Result<Vec<Emote>> {
        let emotes: Vec<BttvEmote> = self
            .client
            .get(format!("{}/emotes/global", API_URL))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(emotes.into_iter().map(Emote::from).collect())
    }

    async fn channel_emotes(&self, channel_id: &str) -> Result<Vec<Emote>> {
        let channel: BttvChannel = self
            .client
            .get(format!("{}/users/twitch/{}", API_URL, channel_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(channel
            .channel_emotes
            .into_iter()
            .chain(channel.shared_emotes)
            .map(Emote::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_and_shared_emotes_are_combined() {
        let json = r#"{
            "id": "x",
            "channelEmotes": [{"id": "a1", "code": "monkaS", "imageType": "png"}],
            "sharedEmotes": [{"id": "b2", "code": "IceCold", "imageType": "gif"}]
        }"#;
        let channel: BttvChannel = serde_json::from_str(json).unwrap();
        let emotes: Vec<Emote> = channel
            .channel_emotes
            .into_iter()
            .chain(channel.shared_emotes)
            .map(Emote::from)
            .collect();

        assert_eq!(emotes[0].url, "https://cdn.betterttv.net/emote/a1/2x");
        assert!(!emotes[0].zero_width);
        assert_eq!(emotes[1].name, "IceCold");
        assert!(emotes[1].zero_width);
    }
}
