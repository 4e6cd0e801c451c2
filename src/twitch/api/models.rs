use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::emotes::models::{CheerEmote, CheerTier, Emote, EmoteSource, TwitchBadge};

#[derive(Debug, Deserialize)]
pub struct HelixResponse<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct BadgeSet {
    pub set_id: String,
    pub versions: Vec<BadgeVersion>,
}

#[derive(Debug, Deserialize)]
pub struct BadgeVersion {
    pub id: String,
    pub image_url_1x: String,
    pub image_url_2x: Option<String>,
    pub title: Option<String>,
}

impl BadgeSet {
    pub fn into_badges(self) -> impl Iterator<Item = TwitchBadge> {
        let set_id = self.set_id;
        self.versions.into_iter().map(move |v| TwitchBadge {
            set_id: set_id.clone(),
            version: v.id,
            title: v.title,
            url: v.image_url_2x.unwrap_or(v.image_url_1x),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HelixEmote {
    pub id: String,
    pub name: String,
    pub images: HelixEmoteImages,
}

#[derive(Debug, Deserialize)]
pub struct HelixEmoteImages {
    pub url_1x: String,
    pub url_2x: Option<String>,
}

impl From<HelixEmote> for Emote {
    fn from(emote: HelixEmote) -> Self {
        Emote::new(
            emote.name,
            emote.images.url_2x.unwrap_or(emote.images.url_1x),
            EmoteSource::Twitch,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct Cheermote {
    pub prefix: String,
    pub tiers: Vec<CheermoteTier>,
}

#[derive(Debug, Deserialize)]
pub struct CheermoteTier {
    pub min_bits: u32,
    pub color: Option<String>,
    /// theme → format → scale → url
    pub images: HashMap<String, HashMap<String, HashMap<String, String>>>,
}

impl CheermoteTier {
    fn image(&self) -> Option<String> {
        let theme = self.images.get("dark").or_else(|| self.images.values().next())?;
        let format = theme.get("animated").or_else(|| theme.get("static"))?;
        ["2", "1"].iter().find_map(|scale| format.get(*scale).cloned())
    }
}

impl From<Cheermote> for CheerEmote {
    fn from(cheermote: Cheermote) -> Self {
        let tiers = cheermote
            .tiers
            .into_iter()
            .filter_map(|tier| {
                let url = tier.image()?;
                Some(CheerTier {
                    min_bits: tier.min_bits,
                    color: tier.color,
                    url,
                })
            })
            .collect();
        CheerEmote {
            prefix: cheermote.prefix,
            tiers,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GqlRequest<V: Serialize> {
    pub query: &'static str,
    pub variables: V,
}

#[derive(Debug, Deserialize)]
pub struct GqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoCommentsData {
    pub video: Option<VideoComments>,
}

#[derive(Debug, Deserialize)]
pub struct VideoComments {
    pub comments: Option<CommentConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentConnection {
    #[serde(default)]
    pub edges: Vec<CommentEdge>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommentEdge {
    pub cursor: Option<String>,
    pub node: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: String,
    pub commenter: Option<Commenter>,
    pub content_offset_seconds: f64,
    pub created_at: Option<String>,
    pub message: CommentMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commenter {
    pub id: String,
    pub login: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentMessage {
    #[serde(default)]
    pub fragments: Vec<CommentFragment>,
    #[serde(default)]
    pub user_badges: Vec<CommentBadge>,
    pub user_color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentFragment {
    pub text: String,
    pub emote: Option<FragmentEmote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentEmote {
    #[serde(rename = "emoteID")]
    pub emote_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentBadge {
    #[serde(rename = "setID")]
    pub set_id: String,
    pub version: String,
}
