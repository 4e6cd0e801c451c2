use serde::{Deserialize, Serialize};

/// `start` and `end` are inclusive character offsets (Unicode scalar values),
/// always relative to the body as delivered, including any prepended system text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchEmote {
    pub id: String,
    pub start: usize,
    pub end: usize,
}

impl TwitchEmote {
    pub fn new(id: impl Into<String>, start: usize, end: usize) -> Self {
        TwitchEmote { id: id.into(), start, end }
    }

    pub fn shifted(&self, by: usize) -> Self {
        TwitchEmote {
            id: self.id.clone(),
            start: self.start + by,
            end: self.end + by,
        }
    }

    pub fn text_in<'a>(&self, body: &'a str) -> Option<&'a str> {
        if self.end < self.start {
            return None;
        }
        let mut indices = body.char_indices().map(|(i, _)| i).chain(std::iter::once(body.len()));
        let start = indices.nth(self.start)?;
        let end = indices.nth(self.end - self.start)?;
        body.get(start..end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Badge {
    pub set_id: String,
    pub version: String,
}

impl Badge {
    pub fn new(set_id: impl Into<String>, version: impl Into<String>) -> Self {
        Badge { set_id: set_id.into(), version: version.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    pub display_name: Option<String>,
    pub message: String,
    pub color: Option<String>,
    pub is_action: bool,
    pub is_reward: bool,
    pub is_first: bool,
    pub emotes: Vec<TwitchEmote>,
    pub badges: Vec<Badge>,
    pub timestamp: Option<i64>,
    pub full_msg: String,
}

impl ChatMessage {
    pub fn author(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.user_login.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    ClearMsg,
    ClearChat,
    Timeout,
    Ban,
    Notice,
    UserNotice,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::ClearMsg => "clearmsg",
            CommandKind::ClearChat => "clearchat",
            CommandKind::Timeout => "timeout",
            CommandKind::Ban => "ban",
            CommandKind::Notice => "notice",
            CommandKind::UserNotice => "usernotice",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `message` is the target login for clear/ban events and the text for notices.
/// `duration` holds the ban length in seconds for timeouts, and the deleted
/// message text for `clearmsg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub message: Option<String>,
    pub duration: Option<String>,
    pub kind: CommandKind,
    pub msg_id: Option<String>,
    pub timestamp: Option<i64>,
    pub emotes: Vec<TwitchEmote>,
    pub full_msg: String,
}

impl Command {
    pub fn new(kind: CommandKind, full_msg: impl Into<String>) -> Self {
        Command {
            message: None,
            duration: None,
            kind,
            msg_id: None,
            timestamp: None,
            emotes: Vec::new(),
            full_msg: full_msg.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomState {
    pub room_id: Option<String>,
    pub emote_only: Option<bool>,
    /// Minimum follow age in minutes, `-1` when followers-only is off.
    pub followers_only: Option<i32>,
    pub r9k: Option<bool>,
    /// Slow mode interval in seconds, `0` when off.
    pub slow: Option<u32>,
    pub subs_only: Option<bool>,
}

impl RoomState {
    pub fn merge(&mut self, update: &RoomState) {
        if update.room_id.is_some() {
            self.room_id = update.room_id.clone();
        }
        if update.emote_only.is_some() {
            self.emote_only = update.emote_only;
        }
        if update.followers_only.is_some() {
            self.followers_only = update.followers_only;
        }
        if update.r9k.is_some() {
            self.r9k = update.r9k;
        }
        if update.slow.is_some() {
            self.slow = update.slow;
        }
        if update.subs_only.is_some() {
            self.subs_only = update.subs_only;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chatter {
    pub name: String,
}

impl Chatter {
    pub fn new(name: impl Into<String>) -> Self {
        Chatter { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEntry {
    Message(ChatMessage),
    Command(Command),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Stopped,
}
