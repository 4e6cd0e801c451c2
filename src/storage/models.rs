use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecentEmote {
    pub name: String,
    pub url: String,
    /// Milliseconds since the Unix epoch.
    pub used_at: i64,
}

impl RecentEmote {
    pub fn new(name: impl Into<String>, url: impl Into<String>, used_at: i64) -> Self {
        RecentEmote {
            name: name.into(),
            url: url.into(),
            used_at,
        }
    }
}
