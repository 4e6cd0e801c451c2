use crate::chat::errors::Result;
use crate::chat::models::Chatter;
use crate::twitch::irc::LiveChatController;
use crate::twitch::replay::ReplayController;

pub enum ChatController {
    Live(LiveChatController),
    Replay(ReplayController),
}

impl ChatController {
    pub fn start(&self) {
        match self {
            ChatController::Live(live) => live.start(),
            ChatController::Replay(replay) => replay.start(),
        }
    }

    pub fn pause(&self) {
        match self {
            ChatController::Live(live) => live.pause(),
            ChatController::Replay(replay) => replay.pause(),
        }
    }

    pub fn stop(&self) {
        match self {
            ChatController::Live(live) => live.stop(),
            ChatController::Replay(replay) => replay.stop(),
        }
    }

    pub async fn send(&self, text: &str) -> Result<()> {
        match self {
            ChatController::Live(live) => live.send(text).await,
            ChatController::Replay(_) => Ok(()),
        }
    }

    pub async fn add_emote_sets(&self) {
        if let ChatController::Live(live) = self {
            live.add_emote_sets().await;
        }
    }

    pub fn chatters(&self) -> Vec<Chatter> {
        match self {
            ChatController::Live(live) => live.chatters(),
            ChatController::Replay(_) => Vec::new(),
        }
    }
}
