use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};

use crate::chat::handler::ChatEventHandler;
use crate::chat::models::{ChatMessage, Command, CommandKind, RoomState};
use crate::twitch::irc::decoder::{self, DecodedLine, LineKind};
use crate::twitch::irc::tags::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    pub show_user_notice: bool,
    pub show_clear_msg: bool,
    pub show_clear_chat: bool,
}

impl Default for ListenerOptions {
    fn default() -> Self {
        ListenerOptions {
            show_user_notice: true,
            show_clear_msg: true,
            show_clear_chat: true,
        }
    }
}

/// One listener lives for one connection: the emote-set list of the user
/// state is reported only the first time it is seen.
pub struct MessageListener {
    handler: Arc<dyn ChatEventHandler>,
    options: ListenerOptions,
    emote_sets_reported: AtomicBool,
}

impl MessageListener {
    pub fn new(handler: Arc<dyn ChatEventHandler>, options: ListenerOptions) -> Self {
        MessageListener {
            handler,
            options,
            emote_sets_reported: AtomicBool::new(false),
        }
    }

    pub fn on_raw_line(&self, raw: &str) {
        if let Some(line) = decoder::decode(raw) {
            self.on_line(&line);
        }
    }

    pub fn on_line(&self, line: &DecodedLine<'_>) {
        match line.kind {
            LineKind::Privmsg => self.on_message(line),
            LineKind::Notice => self.on_notice(line),
            LineKind::ClearMsg => self.on_clear_message(line),
            LineKind::ClearChat => self.on_clear_chat(line),
            LineKind::UserNotice => self.on_user_notice(line),
            LineKind::RoomState => self.on_room_state(line),
            LineKind::UserState | LineKind::GlobalUserState => self.on_user_state(line),
            _ => trace!("Ignoring {} line", line.command),
        }
    }

    fn on_message(&self, line: &DecodedLine<'_>) {
        let (text, is_action) = decoder::strip_action(line.body().unwrap_or(""));
        let tags = &line.tags;
        let message = ChatMessage {
            id: tags.get(Tag::ID).map(str::to_string),
            user_id: tags.get(Tag::USER_ID).map(str::to_string),
            user_login: line.nick().map(str::to_string),
            display_name: tags.get(Tag::DISPLAY_NAME).map(decoder::unescape_spaces),
            message: text.to_string(),
            color: tags.get(Tag::COLOR).map(str::to_string),
            is_action,
            is_reward: tags.get(Tag::CUSTOM_REWARD_ID).is_some(),
            is_first: tags.get(Tag::FIRST_MESSAGE) == Some("1"),
            emotes: tags.get(Tag::EMOTES).map(decoder::parse_emotes).unwrap_or_default(),
            badges: tags.get(Tag::BADGES).map(decoder::parse_badges).unwrap_or_default(),
            timestamp: timestamp(line),
            full_msg: line.raw.to_string(),
        };
        debug!("Chat message from {:?}: {}", message.author(), message.message);
        self.handler.on_message(message);
    }

    fn on_notice(&self, line: &DecodedLine<'_>) {
        let mut command = Command::new(CommandKind::Notice, line.raw);
        command.message = line.body().map(str::to_string);
        command.msg_id = line.tags.get(Tag::MESSAGE_ID).map(str::to_string);
        self.handler.on_command(command);
    }

    fn on_clear_message(&self, line: &DecodedLine<'_>) {
        if !self.options.show_clear_msg {
            return;
        }
        let mut command = Command::new(CommandKind::ClearMsg, line.raw);
        command.message = line.tags.get(Tag::LOGIN).map(str::to_string);
        command.duration = line.body().map(str::to_string);
        command.timestamp = timestamp(line);
        self.handler.on_command(command);
    }

    fn on_clear_chat(&self, line: &DecodedLine<'_>) {
        if !self.options.show_clear_chat {
            return;
        }
        let user = line.body().map(str::to_string);
        let duration = line.tags.get(Tag::BAN_DURATION).map(str::to_string);
        let kind = match (&user, &duration) {
            (None, _) => CommandKind::ClearChat,
            (Some(_), Some(_)) => CommandKind::Timeout,
            (Some(_), None) => CommandKind::Ban,
        };
        let mut command = Command::new(kind, line.raw);
        command.message = user;
        command.duration = duration;
        command.timestamp = timestamp(line);
        self.handler.on_command(command);
    }

    fn on_user_notice(&self, line: &DecodedLine<'_>) {
        if !self.options.show_user_notice {
            return;
        }
        let tags = &line.tags;
        let system = tags.get(Tag::SYSTEM_MESSAGE).map(decoder::unescape_spaces);
        let body = line.body();
        let emotes = tags.get(Tag::EMOTES).map(decoder::parse_emotes).unwrap_or_default();

        let mut command = Command::new(CommandKind::UserNotice, line.raw);
        match (system, body) {
            (Some(system), Some(body)) => {
                let offset = system.chars().count() + 1;
                command.emotes = emotes.iter().map(|e| e.shifted(offset)).collect();
                command.message = Some(format!("{} {}", system, body));
            }
            (Some(system), None) => command.message = Some(system),
            (None, Some(body)) => {
                command.emotes = emotes;
                command.message = Some(body.to_string());
            }
            (None, None) => command.message = Some(line.raw.to_string()),
        }
        command.msg_id = tags.get(Tag::MESSAGE_ID).map(str::to_string);
        command.timestamp = timestamp(line);
        self.handler.on_command(command);
    }

    fn on_room_state(&self, line: &DecodedLine<'_>) {
        let tags = &line.tags;
        let state = RoomState {
            room_id: tags.get(Tag::ROOM_ID).map(str::to_string),
            emote_only: tags.get(Tag::EMOTE_ONLY).and_then(parse_flag),
            followers_only: tags.get(Tag::FOLLOWERS_ONLY).and_then(|v| v.parse().ok()),
            r9k: tags.get(Tag::R9K).and_then(parse_flag),
            slow: tags.get(Tag::SLOW).and_then(|v| v.parse().ok()),
            subs_only: tags.get(Tag::SUBS_ONLY).and_then(parse_flag),
        };
        self.handler.on_room_state(state);
    }

    fn on_user_state(&self, line: &DecodedLine<'_>) {
        let Some(sets) = line.tags.get(Tag::EMOTE_SETS) else { return };
        if self.emote_sets_reported.swap(true, Ordering::SeqCst) {
            return;
        }
        let sets = sets
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self.handler.on_user_state(sets);
    }
}

fn timestamp(line: &DecodedLine<'_>) -> Option<i64> {
    line.tags.get(Tag::TIMESTAMP).and_then(|v| v.parse().ok())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}
