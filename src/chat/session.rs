use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::chat::controller::ChatController;
use crate::chat::errors::{ChatError, Result};
use crate::chat::handler::ChatEventHandler;
use crate::chat::models::{ChatEntry, ChatMessage, Chatter, Command, ConnectionState, RoomState};
use crate::chat::scrollback::{Scrollback, DEFAULT_SCROLLBACK_LIMIT};
use crate::config::Config;
use crate::emotes::{Emote, EmoteAggregator, EmoteCatalog};
use crate::storage::{RecentEmote, RecentEmoteStore};
use crate::twitch::irc::{ChatCredentials, ListenerOptions, LiveChatController, Transport};
use crate::twitch::replay::manager::DEFAULT_POLL_INTERVAL;
use crate::twitch::replay::{ChatLogFetcher, PlaybackClock, ReplayController, DEFAULT_PAGE_SIZE};

const EVENT_CAPACITY: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Message(ChatMessage),
    Command(Command),
    RoomState(RoomState),
    UserState(Vec<String>),
    Clear,
    NewChatter(Chatter),
    Connection(ConnectionState),
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub scrollback_limit: usize,
    pub listener: ListenerOptions,
    pub replay_page_size: usize,
    pub replay_poll_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            scrollback_limit: DEFAULT_SCROLLBACK_LIMIT,
            listener: ListenerOptions::default(),
            replay_page_size: DEFAULT_PAGE_SIZE,
            replay_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        SessionSettings {
            scrollback_limit: config.scrollback_limit,
            listener: config.listener_options(),
            replay_page_size: config.replay_page_size,
            replay_poll_interval: Duration::from_millis(config.replay_poll_interval_ms),
        }
    }
}

pub struct SessionState {
    scrollback: Scrollback,
    room_state: RwLock<RoomState>,
    last_command: RwLock<Option<Command>>,
    events: broadcast::Sender<ChatEvent>,
}

impl SessionState {
    fn new(scrollback_limit: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SessionState {
            scrollback: Scrollback::new(scrollback_limit),
            room_state: RwLock::new(RoomState::default()),
            last_command: RwLock::new(None),
            events,
        }
    }

    fn publish(&self, event: ChatEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl ChatEventHandler for SessionState {
    fn on_message(&self, message: ChatMessage) {
        self.scrollback.push(ChatEntry::Message(message.clone()));
        self.publish(ChatEvent::Message(message));
    }

    fn on_user_state(&self, emote_sets: Vec<String>) {
        debug!("User has {} emote sets", emote_sets.len());
        self.publish(ChatEvent::UserState(emote_sets));
    }

    fn on_room_state(&self, state: RoomState) {
        let merged = {
            let mut room_state = self.room_state.write();
            room_state.merge(&state);
            room_state.clone()
        };
        self.publish(ChatEvent::RoomState(merged));
    }

    fn on_command(&self, command: Command) {
        self.scrollback.push(ChatEntry::Command(command.clone()));
        *self.last_command.write() = Some(command.clone());
        self.publish(ChatEvent::Command(command));
    }

    fn on_clear(&self) {
        self.scrollback.clear();
        self.publish(ChatEvent::Clear);
    }

    fn on_new_chatter(&self, chatter: &Chatter) {
        self.publish(ChatEvent::NewChatter(chatter.clone()));
    }

    fn on_connection_state(&self, state: ConnectionState) {
        self.publish(ChatEvent::Connection(state));
    }
}

/// Only the first `start_live`/`start_replay` call takes effect.
pub struct ChatSession {
    settings: SessionSettings,
    state: Arc<SessionState>,
    catalog: Arc<EmoteCatalog>,
    aggregator: Arc<EmoteAggregator>,
    store: Option<Arc<dyn RecentEmoteStore>>,
    controller: RwLock<Option<Arc<ChatController>>>,
    scope: CancellationToken,
}

impl ChatSession {
    pub fn new(
        settings: SessionSettings,
        aggregator: Arc<EmoteAggregator>,
        store: Option<Arc<dyn RecentEmoteStore>>,
    ) -> Self {
        ChatSession {
            state: Arc::new(SessionState::new(settings.scrollback_limit)),
            settings,
            catalog: Arc::new(EmoteCatalog::new()),
            aggregator,
            store,
            controller: RwLock::new(None),
            scope: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.state.events.subscribe()
    }

    pub fn start_live(
        &self,
        channel: &str,
        channel_id: Option<String>,
        credentials: ChatCredentials,
        transport: Arc<dyn Transport>,
    ) {
        let mut slot = self.controller.write();
        if slot.is_some() {
            return;
        }
        info!("Starting live chat for #{}", channel);
        match channel_id {
            Some(id) => self.load_emotes(id),
            None => self.load_emotes_on_room_id(),
        }
        let live = LiveChatController::new(
            channel,
            credentials,
            transport,
            self.state.clone(),
            self.catalog.clone(),
            self.aggregator.clone(),
            self.store.clone(),
            self.settings.listener,
            self.scope.child_token(),
        );
        let controller = Arc::new(ChatController::Live(live));
        controller.start();
        *slot = Some(controller);
    }

    pub fn start_replay(
        &self,
        video_id: &str,
        start_offset: f64,
        channel_id: Option<String>,
        fetcher: Arc<dyn ChatLogFetcher>,
        clock: Arc<dyn PlaybackClock>,
    ) {
        let mut slot = self.controller.write();
        if slot.is_some() {
            return;
        }
        info!("Starting chat replay for video {}", video_id);
        if let Some(id) = channel_id {
            self.load_emotes(id);
        }
        let replay = ReplayController::new(
            video_id,
            start_offset,
            fetcher,
            clock,
            self.state.clone(),
            self.scope.child_token(),
        )
        .with_page_size(self.settings.replay_page_size)
        .with_poll_interval(self.settings.replay_poll_interval);
        let controller = Arc::new(ChatController::Replay(replay));
        controller.start();
        *slot = Some(controller);
    }

    fn controller(&self) -> Option<Arc<ChatController>> {
        self.controller.read().clone()
    }

    pub fn start(&self) {
        if let Some(controller) = self.controller() {
            controller.start();
        }
    }

    pub fn pause(&self) {
        if let Some(controller) = self.controller() {
            controller.pause();
        }
    }

    pub fn stop(&self) {
        if let Some(controller) = self.controller() {
            controller.stop();
        }
        self.scope.cancel();
    }

    pub async fn send(&self, text: &str) -> Result<()> {
        match self.controller() {
            Some(controller) => controller.send(text).await,
            None => Err(ChatError::NotConnected),
        }
    }

    pub async fn add_emote_sets(&self) {
        if let Some(controller) = self.controller() {
            controller.add_emote_sets().await;
        }
    }

    pub fn messages(&self) -> Vec<ChatEntry> {
        self.state.scrollback.snapshot()
    }

    pub fn room_state(&self) -> RoomState {
        self.state.room_state.read().clone()
    }

    pub fn last_command(&self) -> Option<Command> {
        self.state.last_command.read().clone()
    }

    pub fn chatters(&self) -> Vec<Chatter> {
        self.controller().map(|c| c.chatters()).unwrap_or_default()
    }

    pub fn catalog(&self) -> &Arc<EmoteCatalog> {
        &self.catalog
    }

    pub fn emote(&self, trigger: &str) -> Option<Emote> {
        self.catalog.get(trigger)
    }

    pub fn recent_emotes(&self) -> Vec<RecentEmote> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        store
            .recent()
            .into_iter()
            .filter(|emote| self.catalog.contains(&emote.name))
            .collect()
    }

    fn load_emotes(&self, channel_id: String) {
        let aggregator = self.aggregator.clone();
        let catalog = self.catalog.clone();
        let scope = self.scope.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = scope.cancelled() => {}
                _ = aggregator.load_channel(&channel_id, &catalog) => {}
            }
        });
    }

    fn load_emotes_on_room_id(&self) {
        let mut events = self.subscribe();
        let aggregator = self.aggregator.clone();
        let catalog = self.catalog.clone();
        let scope = self.scope.clone();
        tokio::spawn(async move {
            let channel_id = loop {
                let event = tokio::select! {
                    _ = scope.cancelled() => return,
                    event = events.recv() => event,
                };
                match event {
                    Ok(ChatEvent::RoomState(RoomState { room_id: Some(id), .. })) => break id,
                    Ok(_) | Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return,
                }
            };
            debug!("Room state revealed channel id {}", channel_id);
            tokio::select! {
                _ = scope.cancelled() => {}
                _ = aggregator.load_channel(&channel_id, &catalog) => {}
            }
        });
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
