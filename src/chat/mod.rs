pub mod controller;
pub mod errors;
pub mod handler;
pub mod models;
pub mod scrollback;
pub mod session;

pub use controller::ChatController;
pub use errors::{ChatError, Result};
pub use handler::ChatEventHandler;
pub use session::{ChatEvent, ChatSession, SessionSettings};
