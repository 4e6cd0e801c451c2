use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::chat::errors::{ChatError, Result};
use crate::config::Config;
use crate::emotes::models::{CheerEmote, Emote, TwitchBadge};
use crate::emotes::sources::{BadgeSource, CheerSource, EmoteSetSource};
use crate::twitch::api::models::{BadgeSet, Cheermote, HelixEmote, HelixResponse};

const HELIX_URL: &str = "https://api.twitch.tv/helix";

#[derive(Clone)]
pub struct HelixClient {
    pub(crate) client: Client,
    client_id: String,
    token: String,
}

impl HelixClient {
    pub fn new(client: Client, client_id: impl Into<String>, token: &str) -> Self {
        HelixClient {
            client,
            client_id: client_id.into(),
            token: token.trim_start_matches("oauth:").to_string(),
        }
    }

    /// `None` unless both a Helix client id and a user token are configured.
    pub fn from_config(config: &Config, client: Client) -> Option<Self> {
        let client_id = config.helix_client_id.as_deref()?;
        let token = config.oauth_token.as_deref()?;
        Some(HelixClient::new(client, client_id, token))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let response = self
            .client
            .get(format!("{}/{}", HELIX_URL, path))
            .query(query)
            .header("Client-ID", &self.client_id)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        debug!("Helix {} responded with {}", path, response.status());
        if !response.status().is_success() {
            return Err(ChatError::InvalidResponse(format!(
                "Helix {} failed with status {}",
                path,
                response.status()
            )));
        }
        let body: HelixResponse<T> = response.json().await?;
        Ok(body.data)
    }
}

#[async_trait]
impl BadgeSource for HelixClient {
    async fn global_badges(&self) -> Result<Vec<TwitchBadge>> {
        let sets: Vec<BadgeSet> = self.get("chat/badges/global", &[]).await?;
        Ok(sets.into_iter().flat_map(BadgeSet::into_badges).collect())
    }

    async fn channel_badges(&self, channel_id: &str) -> Result<Vec<TwitchBadge>> {
        let sets: Vec<BadgeSet> = self
            .get("chat/badges", &[("broadcaster_id", channel_id)])
            .await?;
        Ok(sets.into_iter().flat_map(BadgeSet::into_badges).collect())
    }
}

#[async_trait]
impl EmoteSetSource for HelixClient {
    async fn emote_sets(&self, set_ids: &[String]) -> Result<Vec<Emote>> {
        let query: Vec<(&str, &str)> = set_ids
            .iter()
            .map(|id| ("emote_set_id", id.as_str()))
            .collect();
        let emotes: Vec<HelixEmote> = self.get("chat/emotes/set", &query).await?;
        Ok(emotes.into_iter().map(Emote::from).collect())
    }
}

#[async_trait]
impl CheerSource for HelixClient {
    async fn cheer_emotes(&self, channel_id: &str) -> Result<Vec<CheerEmote>> {
        let cheermotes: Vec<Cheermote> = self
            .get("bits/cheermotes", &[("broadcaster_id", channel_id)])
            .await?;
        Ok(cheermotes.into_iter().map(CheerEmote::from).collect())
    }
}
