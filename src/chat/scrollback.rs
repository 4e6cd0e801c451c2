use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::chat::models::ChatEntry;

pub const DEFAULT_SCROLLBACK_LIMIT: usize = 200;

pub struct Scrollback {
    entries: RwLock<VecDeque<ChatEntry>>,
    limit: usize,
}

impl Default for Scrollback {
    fn default() -> Self {
        Scrollback::new(DEFAULT_SCROLLBACK_LIMIT)
    }
}

impl Scrollback {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Scrollback {
            entries: RwLock::new(VecDeque::with_capacity(limit)),
            limit,
        }
    }

    pub fn push(&self, entry: ChatEntry) {
        let mut entries = self.entries.write();
        while entries.len() >= self.limit {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn snapshot(&self) -> Vec<ChatEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::models::ChatMessage;

    fn entry(text: &str) -> ChatEntry {
        ChatEntry::Message(ChatMessage {
            message: text.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn evicts_oldest_beyond_limit() {
        let scrollback = Scrollback::new(2);
        scrollback.push(entry("a"));
        scrollback.push(entry("b"));
        scrollback.push(entry("c"));

        assert_eq!(scrollback.snapshot(), vec![entry("b"), entry("c")]);
    }

    #[test]
    fn clear_empties_history() {
        let scrollback = Scrollback::default();
        scrollback.push(entry("a"));
        scrollback.clear();
        assert!(scrollback.is_empty());
        assert_eq!(scrollback.limit(), DEFAULT_SCROLLBACK_LIMIT);
    }
}
