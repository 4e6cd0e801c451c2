use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::config::{Environment, File, FileFormat};
use log::info;
use serde::{Deserialize, Serialize};

use crate::chat::errors::Result;
use crate::chat::scrollback::DEFAULT_SCROLLBACK_LIMIT;
use crate::logging::LogLevel;
use crate::twitch::api::gql::DEFAULT_GQL_CLIENT_ID;
use crate::twitch::irc::{ChatCredentials, ListenerOptions, TlsTransport, Transport, WebSocketTransport};
use crate::twitch::replay::DEFAULT_PAGE_SIZE;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub oauth_token: Option<String>,
    pub helix_client_id: Option<String>,
    pub gql_client_id: Option<String>,
    pub chat_host: String,
    pub chat_port: u16,
    pub use_websocket: bool,
    pub websocket_url: String,
    pub scrollback_limit: usize,
    pub replay_page_size: usize,
    pub replay_poll_interval_ms: u64,
    pub show_user_notice: bool,
    pub show_clear_msg: bool,
    pub show_clear_chat: bool,
    pub recent_emotes_db: Option<PathBuf>,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            username: None,
            display_name: None,
            oauth_token: None,
            helix_client_id: None,
            gql_client_id: None,
            chat_host: "irc.chat.twitch.tv".to_string(),
            chat_port: 6697,
            use_websocket: false,
            websocket_url: "wss://irc-ws.chat.twitch.tv:443".to_string(),
            scrollback_limit: DEFAULT_SCROLLBACK_LIMIT,
            replay_page_size: DEFAULT_PAGE_SIZE,
            replay_poll_interval_ms: 1000,
            show_user_notice: true,
            show_clear_msg: true,
            show_clear_chat: true,
            recent_emotes_db: None,
            log_level: LogLevel::INFO,
        }
    }
}

impl Config {
    pub const DEFAULT_PATH: &'static str = "streamchat.toml";
    const ENV_PREFIX: &'static str = "STREAMCHAT";

    pub fn load(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn save(&self, path: &Path) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some() && self.oauth_token.is_some()
    }

    pub fn credentials(&self) -> ChatCredentials {
        match (&self.username, &self.oauth_token) {
            (Some(username), Some(token)) => {
                let credentials = ChatCredentials::new(username.clone(), token.clone());
                match &self.display_name {
                    Some(name) => credentials.with_display_name(name.clone()),
                    None => credentials.with_display_name(username.clone()),
                }
            }
            _ => ChatCredentials::anonymous(),
        }
    }

    pub fn listener_options(&self) -> ListenerOptions {
        ListenerOptions {
            show_user_notice: self.show_user_notice,
            show_clear_msg: self.show_clear_msg,
            show_clear_chat: self.show_clear_chat,
        }
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        if self.use_websocket {
            Arc::new(WebSocketTransport::new(self.websocket_url.clone()))
        } else {
            Arc::new(TlsTransport::new(self.chat_host.clone(), self.chat_port))
        }
    }

    pub fn gql_client_id(&self) -> &str {
        self.gql_client_id.as_deref().unwrap_or(DEFAULT_GQL_CLIENT_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("streamchat-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(&temp_path("missing")).unwrap();
        assert_eq!(config.chat_port, 6697);
        assert_eq!(config.scrollback_limit, DEFAULT_SCROLLBACK_LIMIT);
        assert!(config.credentials().is_anonymous());
    }

    #[test]
    fn saved_config_loads_back() {
        let path = temp_path("roundtrip");
        let config = Config {
            username: Some("viewer".into()),
            oauth_token: Some("oauth:abc".into()),
            show_clear_chat: false,
            log_level: LogLevel::DEBUG,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.username.as_deref(), Some("viewer"));
        assert!(!loaded.listener_options().show_clear_chat);
        assert_eq!(loaded.log_level, LogLevel::DEBUG);
        assert_eq!(loaded.credentials().display_name.as_deref(), Some("viewer"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = temp_path("partial");
        std::fs::write(&path, "use_websocket = true\nreplay_page_size = 50\n").unwrap();
        let loaded = Config::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!(loaded.use_websocket);
        assert_eq!(loaded.replay_page_size, 50);
        assert_eq!(loaded.chat_host, "irc.chat.twitch.tv");
        assert_eq!(loaded.gql_client_id(), DEFAULT_GQL_CLIENT_ID);
    }
}
