pub mod client;
pub mod decoder;
pub mod listener;
pub mod tags;
pub mod transport;

pub use client::{ChatCredentials, LiveChatController};
pub use listener::{ListenerOptions, MessageListener};
pub use transport::{TlsTransport, Transport, WebSocketTransport};
