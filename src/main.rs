use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use streamchat::chat::models::{Command, CommandKind, ConnectionState};
use streamchat::chat::{ChatEvent, ChatSession, SessionSettings};
use streamchat::emotes::EmoteAggregator;
use streamchat::storage::{RecentEmoteStore, StorageClient};
use streamchat::twitch::GqlClient;
use streamchat::{Config, LogLevel};

#[derive(Parser)]
#[command(name = "streamchat", version, about = "Read and replay Twitch chat from the terminal")]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = Config::DEFAULT_PATH)]
    config: PathBuf,

    /// Log every protocol line
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a channel's live chat. Lines typed on stdin are sent when logged in.
    Live {
        channel: String,
        /// Numeric channel id, learned from the room state when omitted
        #[arg(long)]
        channel_id: Option<String>,
    },
    /// Replay the chat of a past broadcast in real time
    Replay {
        video_id: String,
        /// Start position in seconds
        #[arg(long, default_value_t = 0.0)]
        offset: f64,
        #[arg(long)]
        channel_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let level = if cli.verbose { LogLevel::VERBOSE } else { config.log_level };
    streamchat::logging::init(level)?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("streamchat/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let aggregator = Arc::new(EmoteAggregator::from_config(&config, http.clone()));
    let store: Option<Arc<dyn RecentEmoteStore>> = match &config.recent_emotes_db {
        Some(path) => Some(Arc::new(StorageClient::new(path)?)),
        None => None,
    };
    let session = Arc::new(ChatSession::new(SessionSettings::from_config(&config), aggregator, store));
    let events = session.subscribe();

    match cli.command {
        Commands::Live { channel, channel_id } => {
            session.start_live(&channel, channel_id, config.credentials(), config.transport());
            if config.is_authenticated() {
                tokio::spawn(forward_stdin(Arc::clone(&session)));
            } else {
                info!("No credentials configured, joining #{} anonymously", channel);
            }
        }
        Commands::Replay { video_id, offset, channel_id } => {
            let fetcher = Arc::new(GqlClient::new(http, config.gql_client_id()));
            let started = Instant::now();
            let clock = move || offset + started.elapsed().as_secs_f64();
            session.start_replay(&video_id, offset, channel_id, fetcher, Arc::new(clock));
        }
    }

    tokio::select! {
        _ = print_events(events) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down.");
        }
    }
    session.stop();
    Ok(())
}

async fn forward_stdin(session: Arc<ChatSession>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                if let Err(e) = session.send(line.trim()).await {
                    warn!("Message not sent: {}", e);
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

async fn print_events(mut events: tokio::sync::broadcast::Receiver<ChatEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => print_event(event),
            Err(RecvError::Lagged(skipped)) => warn!("Skipped {} chat events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_event(event: ChatEvent) {
    match event {
        ChatEvent::Message(message) => {
            let author = message.author().unwrap_or("?").to_string();
            let author = match message.color.as_deref().and_then(parse_color) {
                Some((r, g, b)) => author.truecolor(r, g, b).bold(),
                None => author.bold(),
            };
            if message.is_action {
                println!("* {} {}", author, message.message.italic());
            } else {
                println!("{}: {}", author, message.message);
            }
        }
        ChatEvent::Command(command) => println!("{}", describe(&command).yellow()),
        ChatEvent::Clear => println!("{}", "-- chat cleared --".dimmed()),
        ChatEvent::Connection(ConnectionState::Connected) => println!("{}", "-- connected --".green()),
        ChatEvent::Connection(ConnectionState::Disconnected) => println!("{}", "-- disconnected --".red()),
        ChatEvent::RoomState(state) => info!("Room state: {:?}", state),
        _ => {}
    }
}

fn describe(command: &Command) -> String {
    let target = command.message.as_deref().unwrap_or_default();
    match command.kind {
        CommandKind::Timeout => format!(
            "{} was timed out for {}s",
            target,
            command.duration.as_deref().unwrap_or("?")
        ),
        CommandKind::Ban => format!("{} was banned", target),
        CommandKind::ClearChat => "Chat was cleared by a moderator".to_string(),
        CommandKind::ClearMsg => format!(
            "A message from {} was deleted: {}",
            target,
            command.duration.as_deref().unwrap_or_default()
        ),
        CommandKind::Notice | CommandKind::UserNotice => target.to_string(),
    }
}

fn parse_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#1E90FF"), Some((0x1e, 0x90, 0xff)));
        assert_eq!(parse_color("1E90FF"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#GG0000"), None);
    }

    #[test]
    fn non_ascii_colors_are_rejected() {
        assert_eq!(parse_color("#ééé"), None);
    }
}
