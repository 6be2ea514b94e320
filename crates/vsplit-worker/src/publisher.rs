//! Progress stream publisher.
//!
//! Polls the [`ProgressStore`] for one job at a fixed interval and yields a
//! [`StreamEvent`] whenever the stored snapshot differs from the last one
//! delivered. Snapshots written between two ticks may be skipped; delivered
//! snapshots are never reordered. The stream ends after a terminal snapshot
//! or after a single synthetic timeout event. It never writes to the store.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, Stream};
use tokio::time::Instant;

use vsplit_models::{JobId, ProgressSnapshot, StreamEvent};

use crate::progress::ProgressStore;

/// Timing for one progress stream.
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    /// Delay between store reads
    pub poll_interval: Duration,
    /// Wall-clock ceiling before the stream emits a timeout and ends
    pub max_duration: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_duration: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing delivered yet
    Waiting,
    /// At least one snapshot delivered
    Streaming,
    /// Terminal or timeout event delivered
    Done,
}

struct Publisher {
    store: Arc<ProgressStore>,
    job_id: JobId,
    settings: StreamSettings,
    started: Instant,
    last_sent: Option<ProgressSnapshot>,
    phase: Phase,
    polled: bool,
}

impl Publisher {
    /// Run poll ticks until there is something to deliver.
    async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            if self.phase == Phase::Done {
                return None;
            }
            // First read happens immediately
            if self.polled {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
            self.polled = true;

            let changed = self
                .store
                .read(&self.job_id)
                .await
                .filter(|current| self.last_sent.as_ref() != Some(current));

            if let Some(snapshot) = changed.as_ref().filter(|s| s.is_terminal()) {
                self.phase = Phase::Done;
                self.last_sent = Some(snapshot.clone());
                return Some(StreamEvent::Snapshot(snapshot.clone()));
            }

            if self.started.elapsed() >= self.settings.max_duration {
                self.phase = Phase::Done;
                return Some(StreamEvent::timeout());
            }

            if let Some(snapshot) = changed {
                self.phase = Phase::Streaming;
                self.last_sent = Some(snapshot.clone());
                return Some(StreamEvent::Snapshot(snapshot));
            }
        }
    }
}

/// Open a progress stream for `job_id`.
pub fn progress_stream(
    store: Arc<ProgressStore>,
    job_id: JobId,
    settings: StreamSettings,
) -> impl Stream<Item = StreamEvent> + Send + 'static {
    let publisher = Publisher {
        store,
        job_id,
        settings,
        started: Instant::now(),
        last_sent: None,
        phase: Phase::Waiting,
        polled: false,
    };

    stream::unfold(publisher, |mut publisher| async move {
        let event = publisher.next_event().await?;
        Some((event, publisher))
    })
}
