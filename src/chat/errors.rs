use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Line codec error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Chat connection is not established")]
    NotConnected,

    #[error("Anonymous sessions cannot send messages")]
    Anonymous,

    #[error("Chat login failed: {0}")]
    LoginFailed(String),

    #[error("Chat connection closed by server")]
    ConnectionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Chat messages must be a single line")]
    MultilineMessage,
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
