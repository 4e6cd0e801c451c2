use std::collections::{HashSet, VecDeque};

use crate::twitch::replay::models::{ChatLogPage, PageRequest, ReplayComment};

#[derive(Debug, Default)]
pub struct Advance {
    pub cleared: bool,
    pub released: Vec<ReplayComment>,
}

/// Every comment id enters the buffer at most once, so a message is never
/// released twice, whatever the playback position does.
#[derive(Debug)]
pub struct ReplayBuffer {
    pending: VecDeque<ReplayComment>,
    seen: HashSet<String>,
    /// Largest offset released since the last clear.
    visible_max: Option<f64>,
    next: Option<PageRequest>,
}

impl ReplayBuffer {
    pub fn new(start_offset: f64) -> Self {
        ReplayBuffer {
            pending: VecDeque::new(),
            seen: HashSet::new(),
            visible_max: None,
            next: Some(PageRequest::Offset(start_offset)),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_request(&self, position: f64) -> Option<&PageRequest> {
        let request = self.next.as_ref()?;
        match self.pending.back() {
            Some(last) if last.offset_seconds > position => None,
            _ => Some(request),
        }
    }

    pub fn push_page(&mut self, page: ChatLogPage) {
        for comment in page.comments {
            if !self.seen.insert(comment.id.clone()) {
                continue;
            }
            let at = self
                .pending
                .partition_point(|c| c.offset_seconds <= comment.offset_seconds);
            self.pending.insert(at, comment);
        }
        self.next = page.next_cursor.map(PageRequest::Cursor);
    }

    pub fn fail(&mut self) {
        self.next = None;
    }

    pub fn advance(&mut self, position: f64) -> Advance {
        let mut advance = Advance::default();
        if self.visible_max.is_some_and(|max| position < max) {
            self.visible_max = None;
            advance.cleared = true;
        }
        while self
            .pending
            .front()
            .is_some_and(|c| c.offset_seconds <= position)
        {
            if let Some(comment) = self.pending.pop_front() {
                self.visible_max = Some(
                    self.visible_max
                        .map_or(comment.offset_seconds, |max| max.max(comment.offset_seconds)),
                );
                advance.released.push(comment);
            }
        }
        advance
    }
}
