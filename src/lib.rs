pub mod chat;
pub mod config;
pub mod emotes;
pub mod logging;
pub mod storage;
pub mod twitch;

pub use crate::config::Config;
pub use crate::logging::LogLevel;
