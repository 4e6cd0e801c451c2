use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use crate::chat::models::ConnectionState;

pub struct ConnectionMonitor {
    channel: String,
    state: ConnectionState,
    last_connected: Option<DateTime<Utc>>,
    last_message_received: Option<DateTime<Utc>>,
    pub(crate) disconnection_count: u32,
    pub(crate) total_uptime: Duration,
}

impl ConnectionMonitor {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            state: ConnectionState::Disconnected,
            last_connected: None,
            last_message_received: None,
            disconnection_count: 0,
            total_uptime: Duration::zero(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn transition(&mut self, next: ConnectionState) -> bool {
        if self.state == next {
            return false;
        }
        match next {
            ConnectionState::Connecting => {
                self.last_message_received = None;
                info!("Connecting to chat for #{}", self.channel);
            }
            ConnectionState::Connected => {
                self.last_connected = Some(Utc::now());
                info!(
                    "Chat connected to #{}. Total uptime: {}, Disconnection count: {}",
                    self.channel,
                    format_duration(self.total_uptime),
                    self.disconnection_count
                );
            }
            ConnectionState::Disconnected | ConnectionState::Stopped => {
                if let Some(last) = self.last_connected.take() {
                    self.total_uptime = self.total_uptime + (Utc::now() - last);
                    self.disconnection_count += 1;
                }
                if next == ConnectionState::Stopped {
                    info!("Chat for #{} stopped", self.channel);
                } else {
                    warn!(
                        "Chat disconnected from #{}. Total uptime: {}, Disconnection count: {}",
                        self.channel,
                        format_duration(self.total_uptime),
                        self.disconnection_count
                    );
                }
            }
        }
        self.state = next;
        true
    }

    pub fn on_message_received(&mut self) {
        self.last_message_received = Some(Utc::now());
    }

    pub fn is_connection_stale(&self, timeout: Duration) -> bool {
        match self.last_message_received {
            Some(last) => Utc::now().signed_duration_since(last) > timeout,
            None => true,
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let seconds = duration.num_seconds();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}
