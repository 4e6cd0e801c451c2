use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::chat::errors::{ChatError, Result};
use crate::chat::handler::ChatEventHandler;
use crate::chat::models::{ChatMessage, Chatter, Command, ConnectionState, RoomState};
use crate::emotes::{EmoteAggregator, EmoteCatalog};
use crate::storage::{RecentEmote, RecentEmoteStore};
use crate::twitch::connection_monitor::ConnectionMonitor;
use crate::twitch::irc::decoder::{self, LineKind};
use crate::twitch::irc::listener::{ListenerOptions, MessageListener};
use crate::twitch::irc::transport::{LineSink, Transport};

pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(4 * 60);

const CAPABILITIES: &str = "CAP REQ :twitch.tv/tags twitch.tv/commands";
const LOGIN_FAILURES: [&str; 2] = ["Login authentication failed", "Login unsuccessful"];

#[derive(Debug, Clone, Default)]
pub struct ChatCredentials {
    pub login: Option<String>,
    pub token: Option<String>,
    pub display_name: Option<String>,
}

impl ChatCredentials {
    pub fn anonymous() -> Self {
        ChatCredentials::default()
    }

    pub fn new(login: impl Into<String>, token: impl Into<String>) -> Self {
        ChatCredentials {
            login: Some(login.into()),
            token: Some(token.into()),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }

    fn handshake(&self, channel: &str) -> Vec<String> {
        let mut lines = vec![CAPABILITIES.to_string()];
        let nick = match (&self.token, &self.login) {
            (Some(token), Some(login)) => {
                lines.push(format!("PASS oauth:{}", token.trim_start_matches("oauth:")));
                login.to_lowercase()
            }
            _ => format!("justinfan{}", rand::thread_rng().gen_range(1000..100_000)),
        };
        lines.push(format!("NICK {}", nick));
        lines.push(format!("JOIN #{}", channel));
        lines
    }
}

struct LiveShared {
    this: Weak<LiveShared>,
    handler: Arc<dyn ChatEventHandler>,
    catalog: Arc<EmoteCatalog>,
    aggregator: Arc<EmoteAggregator>,
    store: Option<Arc<dyn RecentEmoteStore>>,
    has_token: bool,
    monitor: Mutex<ConnectionMonitor>,
    /// Bumped on every teardown; tasks of an older generation may not publish state.
    generation: AtomicU64,
    chatters: RwLock<HashMap<String, Chatter>>,
    emote_sets: Mutex<Option<Vec<String>>>,
    emote_sets_added: tokio::sync::Mutex<bool>,
    scope: CancellationToken,
}

impl LiveShared {
    fn set_state(&self, generation: u64, state: ConnectionState) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        self.publish_state(state);
    }

    fn publish_state(&self, state: ConnectionState) {
        let changed = {
            let mut monitor = self.monitor.lock();
            if monitor.state() == ConnectionState::Stopped {
                return;
            }
            monitor.transition(state)
        };
        if changed {
            self.handler.on_connection_state(state);
        }
    }

    fn state(&self) -> ConnectionState {
        self.monitor.lock().state()
    }

    async fn add_emote_sets(&self) {
        if !self.has_token {
            return;
        }
        let mut added = self.emote_sets_added.lock().await;
        if *added {
            return;
        }
        let Some(sets) = self.emote_sets.lock().clone() else {
            return;
        };
        let emotes = self.aggregator.load_emote_sets(&sets).await;
        if !emotes.is_empty() {
            info!("Adding {} emotes from {} emote sets", emotes.len(), sets.len());
            self.catalog.set_platform_emotes(emotes);
            *added = true;
        }
    }

    async fn record_recent_emotes(&self, text: &str) {
        let Some(store) = &self.store else { return };
        let used_at = Utc::now().timestamp_millis();
        let mut seen = HashSet::new();
        let used: Vec<RecentEmote> = text
            .split_whitespace()
            .filter(|word| seen.insert(*word))
            .filter_map(|word| self.catalog.get(word))
            .map(|emote| RecentEmote::new(emote.name, emote.url, used_at))
            .collect();
        if used.is_empty() {
            return;
        }
        if let Err(e) = store.insert(used).await {
            warn!("Failed to store recent emotes: {}", e);
        }
    }
}

impl ChatEventHandler for LiveShared {
    fn on_message(&self, message: ChatMessage) {
        if let Some(author) = message.author() {
            let new_chatter = {
                let mut chatters = self.chatters.write();
                if chatters.contains_key(author) {
                    None
                } else {
                    let chatter = Chatter::new(author);
                    chatters.insert(author.to_string(), chatter.clone());
                    Some(chatter)
                }
            };
            if let Some(chatter) = new_chatter {
                self.handler.on_new_chatter(&chatter);
            }
        }
        self.handler.on_message(message);
    }

    fn on_user_state(&self, emote_sets: Vec<String>) {
        *self.emote_sets.lock() = Some(emote_sets.clone());
        self.handler.on_user_state(emote_sets);
        if let Some(this) = self.this.upgrade() {
            let scope = self.scope.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = scope.cancelled() => {}
                    _ = this.add_emote_sets() => {}
                }
            });
        }
    }

    fn on_room_state(&self, state: RoomState) {
        self.handler.on_room_state(state);
    }

    fn on_command(&self, command: Command) {
        self.handler.on_command(command);
    }
}

struct RunningConnection {
    cancel: CancellationToken,
    outgoing: mpsc::UnboundedSender<String>,
}

struct ConnectionContext {
    shared: Arc<LiveShared>,
    transport: Arc<dyn Transport>,
    channel: String,
    credentials: ChatCredentials,
    options: ListenerOptions,
    generation: u64,
}

/// Each `start()` opens a fresh connection on its own task. There is no
/// internal reconnect: when the connection ends the state returns to
/// `Disconnected` and the owner decides whether to start again.
pub struct LiveChatController {
    channel: String,
    credentials: ChatCredentials,
    transport: Arc<dyn Transport>,
    options: ListenerOptions,
    shared: Arc<LiveShared>,
    running: Mutex<Option<RunningConnection>>,
    stopped: AtomicBool,
}

impl LiveChatController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel: &str,
        credentials: ChatCredentials,
        transport: Arc<dyn Transport>,
        handler: Arc<dyn ChatEventHandler>,
        catalog: Arc<EmoteCatalog>,
        aggregator: Arc<EmoteAggregator>,
        store: Option<Arc<dyn RecentEmoteStore>>,
        options: ListenerOptions,
        scope: CancellationToken,
    ) -> Self {
        let channel = channel.trim_start_matches('#').to_lowercase();
        let mut chatters = HashMap::new();
        if let Some(name) = &credentials.display_name {
            chatters.insert(name.clone(), Chatter::new(name.clone()));
        }
        let shared = Arc::new_cyclic(|this| LiveShared {
            this: this.clone(),
            handler,
            catalog,
            aggregator,
            store,
            has_token: !credentials.is_anonymous(),
            monitor: Mutex::new(ConnectionMonitor::new(channel.clone())),
            generation: AtomicU64::new(0),
            chatters: RwLock::new(chatters),
            emote_sets: Mutex::new(None),
            emote_sets_added: tokio::sync::Mutex::new(false),
            scope,
        });
        LiveChatController {
            channel,
            credentials,
            transport,
            options,
            shared,
            running: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn start(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        self.pause();

        let generation = self.shared.generation.load(Ordering::SeqCst);
        let cancel = self.shared.scope.child_token();
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let context = ConnectionContext {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
            channel: self.channel.clone(),
            credentials: self.credentials.clone(),
            options: self.options,
            generation,
        };
        tokio::spawn(run_connection(context, cancel.clone(), outgoing_rx));
        *self.running.lock() = Some(RunningConnection { cancel, outgoing });
    }

    pub fn pause(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };
        running.cancel.cancel();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.set_state(generation, ConnectionState::Disconnected);
    }

    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.pause();
        self.shared.publish_state(ConnectionState::Stopped);
    }

    pub async fn send(&self, text: &str) -> Result<()> {
        if self.credentials.is_anonymous() {
            return Err(ChatError::Anonymous);
        }
        if text.contains(['\r', '\n']) {
            return Err(ChatError::MultilineMessage);
        }
        let outgoing = match &*self.running.lock() {
            Some(running) if self.shared.state() == ConnectionState::Connected => running.outgoing.clone(),
            _ => return Err(ChatError::NotConnected),
        };
        outgoing
            .send(format!("PRIVMSG #{} :{}", self.channel, text))
            .map_err(|_| ChatError::NotConnected)?;
        self.shared.record_recent_emotes(text).await;
        Ok(())
    }

    pub async fn add_emote_sets(&self) {
        self.shared.add_emote_sets().await;
    }

    pub fn chatters(&self) -> Vec<Chatter> {
        self.shared.chatters.read().values().cloned().collect()
    }
}

impl Drop for LiveChatController {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

async fn run_connection(
    context: ConnectionContext,
    cancel: CancellationToken,
    outgoing: mpsc::UnboundedReceiver<String>,
) {
    let shared = Arc::clone(&context.shared);
    let generation = context.generation;
    shared.set_state(generation, ConnectionState::Connecting);

    let result = tokio::select! {
        _ = cancel.cancelled() => Ok(()),
        result = connect_and_read(&context, outgoing) => result,
    };
    match result {
        Ok(()) => info!("Chat connection to #{} closed", context.channel),
        Err(ChatError::LoginFailed(reason)) => error!("Chat login to #{} failed: {}", context.channel, reason),
        Err(e) => warn!("Chat connection to #{} ended: {}", context.channel, e),
    }
    shared.set_state(generation, ConnectionState::Disconnected);
}

enum Flow {
    Continue,
    Close,
}

async fn connect_and_read(
    context: &ConnectionContext,
    mut outgoing: mpsc::UnboundedReceiver<String>,
) -> Result<()> {
    let (mut sink, mut stream) = context.transport.connect().await?;
    for line in context.credentials.handshake(&context.channel) {
        sink.send(line).await?;
    }

    let handler: Arc<dyn ChatEventHandler> = context.shared.clone();
    let listener = MessageListener::new(handler, context.options);
    let mut keepalive = interval_at(Instant::now() + KEEPALIVE_INTERVAL, KEEPALIVE_INTERVAL);

    loop {
        tokio::select! {
            line = stream.next() => match line {
                Some(Ok(line)) => {
                    if let Flow::Close = handle_line(context, &listener, &mut sink, &line).await? {
                        return Ok(());
                    }
                }
                Some(Err(e)) => return Err(e),
                None => return Err(ChatError::ConnectionClosed),
            },
            Some(line) = outgoing.recv() => {
                trace!("> {}", line);
                sink.send(line).await?;
            }
            _ = keepalive.tick() => {
                let stale = context
                    .shared
                    .monitor
                    .lock()
                    .is_connection_stale(chrono::Duration::seconds(2 * KEEPALIVE_INTERVAL.as_secs() as i64));
                if stale {
                    return Err(ChatError::ConnectionClosed);
                }
                sink.send("PING :tmi.twitch.tv".to_string()).await?;
            }
        }
    }
}

async fn handle_line(
    context: &ConnectionContext,
    listener: &MessageListener,
    sink: &mut LineSink,
    raw: &str,
) -> Result<Flow> {
    trace!("< {}", raw);
    context.shared.monitor.lock().on_message_received();
    let Some(line) = decoder::decode(raw) else {
        return Ok(Flow::Continue);
    };
    match line.kind {
        LineKind::Ping => {
            let server = line.trailing().unwrap_or("tmi.twitch.tv");
            sink.send(format!("PONG :{}", server)).await?;
        }
        LineKind::Reconnect => {
            info!("Server requested reconnect for #{}", context.channel);
            return Ok(Flow::Close);
        }
        LineKind::Welcome => {
            debug!("Authenticated to chat as {:?}", line.prefix);
            context.shared.set_state(context.generation, ConnectionState::Connected);
        }
        LineKind::Notice => {
            let body = line.body().unwrap_or("");
            if LOGIN_FAILURES.iter().any(|failure| body.contains(failure)) {
                return Err(ChatError::LoginFailed(body.to_string()));
            }
            listener.on_line(&line);
        }
        _ => listener.on_line(&line),
    }
    Ok(Flow::Continue)
}
