use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::chat::handler::ChatEventHandler;
use crate::twitch::replay::buffer::ReplayBuffer;
use crate::twitch::replay::models::PageRequest;
use crate::twitch::replay::{ChatLogFetcher, PlaybackClock, DEFAULT_PAGE_SIZE};

const MAX_FETCHES_PER_TICK: usize = 5;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct ReplayTimeline {
    video_id: String,
    page_size: usize,
    fetcher: Arc<dyn ChatLogFetcher>,
    handler: Arc<dyn ChatEventHandler>,
    buffer: ReplayBuffer,
}

impl ReplayTimeline {
    pub fn new(
        video_id: impl Into<String>,
        start_offset: f64,
        page_size: usize,
        fetcher: Arc<dyn ChatLogFetcher>,
        handler: Arc<dyn ChatEventHandler>,
    ) -> Self {
        ReplayTimeline {
            video_id: video_id.into(),
            page_size,
            fetcher,
            handler,
            buffer: ReplayBuffer::new(start_offset),
        }
    }

    pub async fn tick_at(&mut self, position: f64) {
        for _ in 0..MAX_FETCHES_PER_TICK {
            let Some(request) = self.buffer.next_request(position).cloned() else {
                break;
            };
            let page = match &request {
                PageRequest::Offset(offset) => {
                    self.fetcher
                        .fetch_by_offset(&self.video_id, *offset, self.page_size)
                        .await
                }
                PageRequest::Cursor(cursor) => {
                    self.fetcher
                        .fetch_by_cursor(&self.video_id, cursor, self.page_size)
                        .await
                }
            };
            match page {
                Ok(page) => {
                    debug!(
                        "Fetched {} comments for video {} ({:?})",
                        page.comments.len(),
                        self.video_id,
                        request
                    );
                    self.buffer.push_page(page);
                }
                Err(e) => {
                    warn!("Failed to fetch chat log for video {}: {}", self.video_id, e);
                    self.buffer.fail();
                }
            }
        }

        let advance = self.buffer.advance(position);
        if advance.cleared {
            debug!("Playback moved back to {:.1}s, clearing replayed chat", position);
            self.handler.on_clear();
        }
        for comment in advance.released {
            self.handler.on_message(comment.message);
        }
    }
}

/// `pause()` and `stop()` both end the current run and drop its buffer and
/// cursor; `start()` clears the replayed chat and begins again from the
/// original start offset.
pub struct ReplayController {
    video_id: String,
    start_offset: f64,
    page_size: usize,
    poll_interval: Duration,
    fetcher: Arc<dyn ChatLogFetcher>,
    clock: Arc<dyn PlaybackClock>,
    handler: Arc<dyn ChatEventHandler>,
    scope: CancellationToken,
    running: Mutex<Option<CancellationToken>>,
}

impl ReplayController {
    pub fn new(
        video_id: impl Into<String>,
        start_offset: f64,
        fetcher: Arc<dyn ChatLogFetcher>,
        clock: Arc<dyn PlaybackClock>,
        handler: Arc<dyn ChatEventHandler>,
        scope: CancellationToken,
    ) -> Self {
        ReplayController {
            video_id: video_id.into(),
            start_offset,
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetcher,
            clock,
            handler,
            scope,
            running: Mutex::new(None),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    pub fn start(&self) {
        self.pause();
        info!(
            "Starting chat replay for video {} at {:.1}s",
            self.video_id, self.start_offset
        );
        self.handler.on_clear();

        let cancel = self.scope.child_token();
        let timeline = ReplayTimeline::new(
            self.video_id.clone(),
            self.start_offset,
            self.page_size,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.handler),
        );
        tokio::spawn(poll(
            timeline,
            Arc::clone(&self.clock),
            self.poll_interval,
            cancel.clone(),
        ));
        *self.running.lock() = Some(cancel);
    }

    pub fn pause(&self) {
        if let Some(cancel) = self.running.lock().take() {
            debug!("Stopping chat replay for video {}", self.video_id);
            cancel.cancel();
        }
    }

    pub fn stop(&self) {
        self.pause();
    }
}

impl Drop for ReplayController {
    fn drop(&mut self) {
        if let Some(cancel) = self.running.get_mut().take() {
            cancel.cancel();
        }
    }
}

async fn poll(
    mut timeline: ReplayTimeline,
    clock: Arc<dyn PlaybackClock>,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let position = clock.position();
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timeline.tick_at(position) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::errors::{ChatError, Result};
    use crate::chat::handler::testing::{Recorded, RecordingHandler};
    use crate::chat::models::ChatMessage;
    use crate::twitch::replay::models::{ChatLogPage, ReplayComment};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn comment(offset: f64) -> ReplayComment {
        ReplayComment {
            id: format!("c{}", offset),
            offset_seconds: offset,
            message: ChatMessage {
                id: Some(format!("c{}", offset)),
                message: format!("at {}", offset),
                ..Default::default()
            },
        }
    }

    /// Serves P1 (0, 5, 10 → C2) by offset and P2 (15, 20, end) by cursor.
    #[derive(Default)]
    struct TwoPages {
        requests: Mutex<Vec<String>>,
        fail_cursor: bool,
    }

    #[async_trait]
    impl ChatLogFetcher for TwoPages {
        async fn fetch_by_offset(&self, _video_id: &str, offset: f64, _page_size: usize) -> Result<ChatLogPage> {
            self.requests.lock().push(format!("offset:{}", offset));
            Ok(ChatLogPage {
                comments: vec![comment(0.0), comment(5.0), comment(10.0)],
                next_cursor: Some("C2".into()),
            })
        }

        async fn fetch_by_cursor(&self, _video_id: &str, cursor: &str, _page_size: usize) -> Result<ChatLogPage> {
            self.requests.lock().push(format!("cursor:{}", cursor));
            if self.fail_cursor {
                return Err(ChatError::InvalidResponse("gone".into()));
            }
            let pages: HashMap<&str, ChatLogPage> = HashMap::from([(
                "C2",
                ChatLogPage {
                    comments: vec![comment(15.0), comment(20.0)],
                    next_cursor: None,
                },
            )]);
            pages
                .get(cursor)
                .cloned()
                .ok_or_else(|| ChatError::InvalidResponse(cursor.to_string()))
        }
    }

    fn released(handler: &RecordingHandler) -> Vec<String> {
        handler.messages().into_iter().map(|m| m.message).collect()
    }

    fn timeline(fetcher: Arc<TwoPages>, handler: Arc<RecordingHandler>) -> ReplayTimeline {
        ReplayTimeline::new("v1", 0.0, DEFAULT_PAGE_SIZE, fetcher, handler)
    }

    #[tokio::test]
    async fn releases_messages_as_playback_passes_them() {
        let fetcher = Arc::new(TwoPages::default());
        let handler = Arc::new(RecordingHandler::default());
        let mut timeline = timeline(fetcher.clone(), handler.clone());

        for position in [0.0, 6.0, 12.0, 18.0] {
            timeline.tick_at(position).await;
        }

        assert_eq!(released(&handler), vec!["at 0", "at 5", "at 10", "at 15"]);
        assert_eq!(*fetcher.requests.lock(), vec!["offset:0", "cursor:C2"]);

        timeline.tick_at(20.0).await;
        assert_eq!(released(&handler).last().map(String::as_str), Some("at 20"));
    }

    #[tokio::test]
    async fn seeking_back_clears_before_further_releases() {
        let fetcher = Arc::new(TwoPages::default());
        let handler = Arc::new(RecordingHandler::default());
        let mut timeline = timeline(fetcher, handler.clone());

        timeline.tick_at(6.0).await;
        timeline.tick_at(3.0).await;
        timeline.tick_at(12.0).await;

        let events: Vec<Recorded> = handler.take();
        let clear = events.iter().position(|e| *e == Recorded::Clear).unwrap();
        let at_10 = events
            .iter()
            .position(|e| matches!(e, Recorded::Message(m) if m.message == "at 10"))
            .unwrap();
        assert!(clear < at_10);
        assert_eq!(events.iter().filter(|e| matches!(e, Recorded::Message(_))).count(), 3);
    }

    #[tokio::test]
    async fn fetch_failure_stops_paging_but_keeps_released() {
        let fetcher = Arc::new(TwoPages {
            fail_cursor: true,
            ..Default::default()
        });
        let handler = Arc::new(RecordingHandler::default());
        let mut timeline = timeline(fetcher.clone(), handler.clone());

        timeline.tick_at(10.0).await;
        timeline.tick_at(30.0).await;
        timeline.tick_at(40.0).await;

        assert_eq!(released(&handler), vec!["at 0", "at 5", "at 10"]);
        assert_eq!(*fetcher.requests.lock(), vec!["offset:0", "cursor:C2"]);
        assert!(!handler.take().contains(&Recorded::Clear));
    }

    #[tokio::test]
    async fn controller_polls_the_clock_and_restarts_from_start_offset() {
        let fetcher = Arc::new(TwoPages::default());
        let handler = Arc::new(RecordingHandler::default());
        let position = Arc::new(AtomicU64::new(6.0f64.to_bits()));
        let clock = {
            let position = position.clone();
            move || f64::from_bits(position.load(Ordering::SeqCst))
        };
        let controller = ReplayController::new(
            "v1",
            0.0,
            fetcher.clone(),
            Arc::new(clock),
            handler.clone(),
            CancellationToken::new(),
        )
        .with_poll_interval(Duration::from_millis(5));

        controller.start();
        for _ in 0..200 {
            if handler.messages().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(released(&handler), vec!["at 0", "at 5"]);

        controller.stop();
        assert!(!controller.is_running());
        position.store(30.0f64.to_bits(), Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(handler.messages().len(), 2);

        handler.take();
        position.store(6.0f64.to_bits(), Ordering::SeqCst);
        controller.start();
        for _ in 0..200 {
            if fetcher.requests.lock().iter().filter(|r| r.starts_with("offset")).count() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(
            fetcher.requests.lock().iter().filter(|r| *r == "offset:0").count(),
            2
        );
        for _ in 0..200 {
            if handler.messages().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let events = handler.take();
        assert_eq!(events.first(), Some(&Recorded::Clear));
        assert_eq!(events.iter().filter(|e| matches!(e, Recorded::Message(_))).count(), 2);
        controller.stop();
    }
}
