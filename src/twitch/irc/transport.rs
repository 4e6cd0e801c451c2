use std::pin::Pin;

use async_trait::async_trait;
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use log::{debug, info};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message as TungsteniteMessage;
use tokio_util::codec::{Framed, LinesCodec};

use crate::chat::errors::{ChatError, Result};

/// Tag blocks push inbound lines well past the classic 512-byte IRC limit.
const MAX_LINE_LENGTH: usize = 64 * 1024;

pub type LineSink = Pin<Box<dyn Sink<String, Error = ChatError> + Send>>;
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Outgoing lines are given without the trailing CRLF; incoming lines are
/// yielded without it. The stream ends when the server closes the connection.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self) -> Result<(LineSink, LineStream)>;
}

pub struct TlsTransport {
    host: String,
    port: u16,
}

impl TlsTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        TlsTransport { host: host.into(), port }
    }
}

#[async_trait]
impl Transport for TlsTransport {
    async fn connect(&self) -> Result<(LineSink, LineStream)> {
        info!("Connecting to {}:{}", self.host, self.port);
        let tcp = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let connector = tokio_native_tls::TlsConnector::from(native_tls::TlsConnector::new()?);
        let tls = connector.connect(&self.host, tcp).await?;
        debug!("TLS handshake with {} complete", self.host);

        let framed = Framed::new(tls, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        let (sink, stream) = framed.split::<String>();
        let sink = sink
            .sink_map_err(ChatError::from)
            .with(|line: String| future::ready(Ok::<_, ChatError>(format!("{}\r", line))));
        let stream = stream.map(|line| line.map_err(ChatError::from));

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

/// IRC over WebSocket. A text frame may carry several CRLF-separated lines.
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketTransport { url: url.into() }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self) -> Result<(LineSink, LineStream)> {
        let url = url::Url::parse(&self.url)?;
        info!("Connecting to {}", url);
        let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;

        let (sink, stream) = ws_stream.split::<TungsteniteMessage>();
        let sink = sink
            .sink_map_err(ChatError::from)
            .with(|line: String| future::ready(Ok::<_, ChatError>(TungsteniteMessage::Text(line))));
        let stream = stream.flat_map(|frame| {
            let lines: Vec<Result<String>> = match frame {
                Ok(TungsteniteMessage::Text(text)) => text
                    .split("\r\n")
                    .filter(|line| !line.is_empty())
                    .map(|line| Ok(line.to_string()))
                    .collect(),
                Ok(TungsteniteMessage::Close(_)) => vec![Err(ChatError::ConnectionClosed)],
                Ok(_) => Vec::new(),
                Err(e) => vec![Err(e.into())],
            };
            futures::stream::iter(lines)
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use futures::channel::mpsc;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    pub struct MemoryServer {
        pub to_client: mpsc::UnboundedSender<Result<String>>,
        pub from_client: mpsc::UnboundedReceiver<String>,
    }

    impl MemoryServer {
        pub fn say(&self, line: &str) {
            let _ = self.to_client.unbounded_send(Ok(line.to_string()));
        }

        pub fn hang_up(&self) {
            self.to_client.close_channel();
        }

        pub async fn next_line(&mut self) -> Option<String> {
            self.from_client.next().await
        }
    }

    #[derive(Default)]
    pub struct MemoryTransport {
        connections: Mutex<VecDeque<(LineSink, LineStream)>>,
    }

    impl MemoryTransport {
        pub fn add_connection(&self) -> MemoryServer {
            let (client_tx, from_client) = mpsc::unbounded::<String>();
            let (to_client, client_rx) = mpsc::unbounded::<Result<String>>();
            let sink: LineSink = Box::pin(client_tx.sink_map_err(|_| ChatError::ConnectionClosed));
            let stream: LineStream = Box::pin(client_rx);
            self.connections.lock().push_back((sink, stream));
            MemoryServer { to_client, from_client }
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn connect(&self) -> Result<(LineSink, LineStream)> {
            let next = self.connections.lock().pop_front();
            next.ok_or_else(|| ChatError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)))
        }
    }
}
