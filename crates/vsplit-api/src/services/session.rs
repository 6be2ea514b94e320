//! In-memory upload history, keyed by session.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use vsplit_models::{SessionId, SessionRecord, UploadRecord};

/// Last uploads per session, newest first. Lives for the process lifetime.
#[derive(Default)]
pub struct SessionLedger {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session, creating an empty one if absent.
    ///
    /// `client_addr` is only stored when the session is created.
    pub async fn get_or_create(
        &self,
        session_id: &SessionId,
        client_addr: Option<String>,
    ) -> SessionRecord {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.clone())
            .or_insert_with(|| {
                debug!(session_id = %session_id, "Creating upload session");
                SessionRecord::new(session_id.clone(), client_addr)
            })
            .clone()
    }

    /// Prepend an upload to the session's history.
    pub async fn record(&self, session_id: &SessionId, upload: UploadRecord) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.clone())
            .or_insert_with(|| SessionRecord::new(session_id.clone(), None))
            .record(upload);
    }

    /// Look up a session without creating it.
    pub async fn get(&self, session_id: &SessionId) -> Option<SessionRecord> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use vsplit_models::MAX_SESSION_UPLOADS;

    fn upload(n: u32) -> UploadRecord {
        UploadRecord {
            filename: format!("clip{}.mp4", n),
            timestamp: Utc::now(),
            size: 2048,
            output_dir: format!("clip{}", n),
            num_segments: 1,
            duration: 12.5,
        }
    }

    #[tokio::test]
    async fn test_get_or_create_keeps_first_client() {
        let ledger = SessionLedger::new();
        let id = SessionId::from_string("tab-1");

        let created = ledger.get_or_create(&id, Some("10.0.0.1".into())).await;
        assert!(created.uploads.is_empty());

        let again = ledger.get_or_create(&id, Some("10.0.0.2".into())).await;
        assert_eq!(again.client_addr.as_deref(), Some("10.0.0.1"));
        assert_eq!(again.created_at, created.created_at);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_eleventh_upload_evicts_oldest() {
        let ledger = SessionLedger::new();
        let id = SessionId::from_string("tab-2");
        ledger.get_or_create(&id, None).await;

        for n in 1..=11 {
            ledger.record(&id, upload(n)).await;
        }

        let session = ledger.get(&id).await.unwrap();
        assert_eq!(session.uploads.len(), MAX_SESSION_UPLOADS);
        assert_eq!(session.uploads[0].filename, "clip11.mp4");
        assert_eq!(session.uploads[9].filename, "clip2.mp4");
    }

    #[tokio::test]
    async fn test_unknown_session_is_absent() {
        let ledger = SessionLedger::new();
        assert!(ledger.get(&SessionId::from_string("nope")).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_records() {
        let ledger = Arc::new(SessionLedger::new());
        let id = SessionId::from_string("shared");

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let ledger = Arc::clone(&ledger);
                let id = id.clone();
                tokio::spawn(async move { ledger.record(&id, upload(n)).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(ledger.get(&id).await.unwrap().uploads.len(), 8);
    }
}
