pub struct Tag;

impl Tag {
    pub const ID: &'static str = "id";
    pub const USER_ID: &'static str = "user-id";
    pub const LOGIN: &'static str = "login";
    pub const DISPLAY_NAME: &'static str = "display-name";
    pub const COLOR: &'static str = "color";
    pub const EMOTES: &'static str = "emotes";
    pub const BADGES: &'static str = "badges";
    pub const CUSTOM_REWARD_ID: &'static str = "custom-reward-id";
    pub const FIRST_MESSAGE: &'static str = "first-msg";
    pub const TIMESTAMP: &'static str = "tmi-sent-ts";
    pub const BAN_DURATION: &'static str = "ban-duration";
    pub const MESSAGE_ID: &'static str = "msg-id";
    pub const SYSTEM_MESSAGE: &'static str = "system-msg";
    pub const EMOTE_SETS: &'static str = "emote-sets";
    pub const ROOM_ID: &'static str = "room-id";
    pub const EMOTE_ONLY: &'static str = "emote-only";
    pub const FOLLOWERS_ONLY: &'static str = "followers-only";
    pub const R9K: &'static str = "r9k";
    pub const SLOW: &'static str = "slow";
    pub const SUBS_ONLY: &'static str = "subs-only";
}
