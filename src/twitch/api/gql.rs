use async_trait::async_trait;
use chrono::DateTime;
use log::debug;
use reqwest::Client;
use serde::Serialize;

use crate::chat::errors::{ChatError, Result};
use crate::chat::models::{Badge, ChatMessage, TwitchEmote};
use crate::twitch::api::models::{
    CommentConnection, CommentNode, GqlRequest, GqlResponse, VideoCommentsData,
};
use crate::twitch::replay::models::{ChatLogPage, ReplayComment};
use crate::twitch::replay::ChatLogFetcher;

const GQL_URL: &str = "https://gql.twitch.tv/gql";

pub const DEFAULT_GQL_CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

const VIDEO_COMMENTS_QUERY: &str = "query VideoComments($videoID: ID!, $first: Int, $contentOffsetSeconds: Int, $after: Cursor) {
  video(id: $videoID) {
    comments(first: $first, contentOffsetSeconds: $contentOffsetSeconds, after: $after) {
      edges {
        cursor
        node {
          id
          commenter { id login displayName }
          contentOffsetSeconds
          createdAt
          message {
            fragments { text emote { emoteID } }
            userBadges { setID version }
            userColor
          }
        }
      }
      pageInfo { hasNextPage }
    }
  }
}";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoCommentsVariables<'a> {
    #[serde(rename = "videoID")]
    video_id: &'a str,
    first: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_offset_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
}

pub struct GqlClient {
    client: Client,
    client_id: String,
}

impl GqlClient {
    pub fn new(client: Client, client_id: impl Into<String>) -> Self {
        GqlClient {
            client,
            client_id: client_id.into(),
        }
    }

    async fn video_comments(&self, variables: VideoCommentsVariables<'_>) -> Result<ChatLogPage> {
        let video_id = variables.video_id.to_string();
        let request = GqlRequest {
            query: VIDEO_COMMENTS_QUERY,
            variables,
        };
        let response: GqlResponse<VideoCommentsData> = self
            .client
            .post(GQL_URL)
            .header("Client-ID", &self.client_id)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.errors.first() {
            return Err(ChatError::InvalidResponse(error.message.clone()));
        }
        let comments = response
            .data
            .and_then(|data| data.video)
            .and_then(|video| video.comments)
            .ok_or_else(|| ChatError::InvalidResponse(format!("no comments for video {}", video_id)))?;
        let page = into_page(comments);
        debug!(
            "Video {} returned {} comments, next cursor: {:?}",
            video_id,
            page.comments.len(),
            page.next_cursor
        );
        Ok(page)
    }
}

#[async_trait]
impl ChatLogFetcher for GqlClient {
    async fn fetch_by_offset(&self, video_id: &str, offset_seconds: f64, page_size: usize) -> Result<ChatLogPage> {
        self.video_comments(VideoCommentsVariables {
            video_id,
            first: page_size,
            content_offset_seconds: Some(offset_seconds.max(0.0).floor() as u64),
            after: None,
        })
        .await
    }

    async fn fetch_by_cursor(&self, video_id: &str, cursor: &str, page_size: usize) -> Result<ChatLogPage> {
        self.video_comments(VideoCommentsVariables {
            video_id,
            first: page_size,
            content_offset_seconds: None,
            after: Some(cursor),
        })
        .await
    }
}

fn into_page(connection: CommentConnection) -> ChatLogPage {
    let next_cursor = if connection.page_info.has_next_page {
        connection.edges.last().and_then(|edge| edge.cursor.clone())
    } else {
        None
    };
    let comments = connection
        .edges
        .into_iter()
        .filter_map(|edge| {
            let full_msg = edge.node.to_string();
            let node: CommentNode = serde_json::from_value(edge.node).ok()?;
            Some(into_comment(node, full_msg))
        })
        .collect();
    ChatLogPage { comments, next_cursor }
}

/// Rebuilds the message body from its fragments, recording emote fragment
/// positions as character ranges the way live messages carry them.
fn into_comment(node: CommentNode, full_msg: String) -> ReplayComment {
    let mut body = String::new();
    let mut emotes = Vec::new();
    let mut chars = 0;
    for fragment in &node.message.fragments {
        let len = fragment.text.chars().count();
        if let Some(emote) = &fragment.emote {
            if len > 0 {
                emotes.push(TwitchEmote::new(emote.emote_id.clone(), chars, chars + len - 1));
            }
        }
        body.push_str(&fragment.text);
        chars += len;
    }

    let (user_id, user_login, display_name) = match node.commenter {
        Some(commenter) => (Some(commenter.id), Some(commenter.login), commenter.display_name),
        None => (None, None, None),
    };
    let timestamp = node
        .created_at
        .as_deref()
        .and_then(|created| DateTime::parse_from_rfc3339(created).ok())
        .map(|created| created.timestamp_millis());

    ReplayComment {
        id: node.id.clone(),
        offset_seconds: node.content_offset_seconds,
        message: ChatMessage {
            id: Some(node.id),
            user_id,
            user_login,
            display_name,
            message: body,
            color: node.message.user_color,
            emotes,
            badges: node
                .message
                .user_badges
                .into_iter()
                .map(|b| Badge::new(b.set_id, b.version))
                .collect(),
            timestamp,
            full_msg,
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"{
        "data": {"video": {"comments": {
            "edges": [
                {"cursor": "a", "node": {
                    "id": "m1",
                    "commenter": {"id": "7", "login": "viewer", "displayName": "Viewer"},
                    "contentOffsetSeconds": 12,
                    "createdAt": "2024-01-01T00:00:12.500Z",
                    "message": {
                        "fragments": [{"text": "héllo ", "emote": null}, {"text": "Kappa", "emote": {"emoteID": "25"}}],
                        "userBadges": [{"setID": "subscriber", "version": "12"}],
                        "userColor": "#FF0000"
                    }
                }},
                {"cursor": "b", "node": {"id": "broken"}}
            ],
            "pageInfo": {"hasNextPage": true}
        }}}
    }"##;

    fn page() -> ChatLogPage {
        let response: GqlResponse<VideoCommentsData> = serde_json::from_str(PAGE).unwrap();
        into_page(response.data.unwrap().video.unwrap().comments.unwrap())
    }

    #[test]
    fn comment_nodes_become_chat_messages() {
        let page = page();
        assert_eq!(page.comments.len(), 1);

        let comment = &page.comments[0];
        assert_eq!(comment.offset_seconds, 12.0);
        let message = &comment.message;
        assert_eq!(message.message, "héllo Kappa");
        assert_eq!(message.author(), Some("Viewer"));
        assert_eq!(message.user_login.as_deref(), Some("viewer"));
        assert_eq!(message.emotes, vec![TwitchEmote::new("25", 6, 10)]);
        assert_eq!(message.emotes[0].text_in(&message.message), Some("Kappa"));
        assert_eq!(message.badges, vec![Badge::new("subscriber", "12")]);
        assert_eq!(message.timestamp, Some(1_704_067_212_500));
        assert!(message.full_msg.contains("\"m1\""));
    }

    #[test]
    fn cursor_comes_from_last_edge_while_pages_remain() {
        assert_eq!(page().next_cursor.as_deref(), Some("b"));

        let last = PAGE.replace("\"hasNextPage\": true", "\"hasNextPage\": false");
        let response: GqlResponse<VideoCommentsData> = serde_json::from_str(&last).unwrap();
        let page = into_page(response.data.unwrap().video.unwrap().comments.unwrap());
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn offset_request_variables() {
        let variables = VideoCommentsVariables {
            video_id: "v1",
            first: 100,
            content_offset_seconds: Some(30),
            after: None,
        };
        let json = serde_json::to_value(&variables).unwrap();
        assert_eq!(json, serde_json::json!({"videoID": "v1", "first": 100, "contentOffsetSeconds": 30}));
    }
}
