use serde::{Deserialize, Serialize};

use crate::chat::models::ChatMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayComment {
    pub id: String,
    /// Seconds from the start of the video.
    pub offset_seconds: f64,
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatLogPage {
    pub comments: Vec<ReplayComment>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    Offset(f64),
    Cursor(String),
}
