pub mod api;
pub mod connection_monitor;
pub mod irc;
pub mod replay;

pub use api::{GqlClient, HelixClient};
pub use irc::{ChatCredentials, LiveChatController};
pub use replay::ReplayController;
