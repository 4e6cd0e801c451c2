use crate::chat::models::{ChatMessage, Chatter, Command, ConnectionState, RoomState};

/// Callbacks run on the task that produced the event (the connection read
/// loop or the replay poller) and must not block.
pub trait ChatEventHandler: Send + Sync {
    fn on_message(&self, message: ChatMessage);

    fn on_user_state(&self, emote_sets: Vec<String>);

    fn on_room_state(&self, state: RoomState);

    fn on_command(&self, command: Command);

    fn on_clear(&self) {}

    fn on_new_chatter(&self, _chatter: &Chatter) {}

    fn on_connection_state(&self, _state: ConnectionState) {}
}
