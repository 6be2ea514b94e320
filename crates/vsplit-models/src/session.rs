//! Per-session upload history.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::SessionId;

/// Maximum number of uploads remembered per session.
pub const MAX_SESSION_UPLOADS: usize = 10;

/// A completed upload as shown in the client's history panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UploadRecord {
    /// Original (sanitized) filename
    pub filename: String,
    /// When the upload finished processing
    pub timestamp: DateTime<Utc>,
    /// Uploaded size in bytes
    pub size: u64,
    /// Output directory name under the output root
    pub output_dir: String,
    /// Number of segments created
    pub num_segments: u32,
    /// Source duration in seconds
    pub duration: f64,
}

/// Upload history for one session, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    /// Address of the client that opened the session
    pub client_addr: Option<String>,
    pub uploads: Vec<UploadRecord>,
}

impl SessionRecord {
    /// Create an empty session.
    pub fn new(session_id: SessionId, client_addr: Option<String>) -> Self {
        Self {
            session_id,
            created_at: Utc::now(),
            client_addr,
            uploads: Vec::new(),
        }
    }

    /// Prepend an upload, evicting the oldest beyond the cap.
    pub fn record(&mut self, upload: UploadRecord) {
        self.uploads.insert(0, upload);
        self.uploads.truncate(MAX_SESSION_UPLOADS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(n: u32) -> UploadRecord {
        UploadRecord {
            filename: format!("video{}.mp4", n),
            timestamp: Utc::now(),
            size: 1024,
            output_dir: format!("video{}", n),
            num_segments: n,
            duration: 60.0,
        }
    }

    #[test]
    fn test_record_keeps_newest_first() {
        let mut session = SessionRecord::new(SessionId::from_string("s"), None);
        session.record(upload(1));
        session.record(upload(2));

        assert_eq!(session.uploads[0].filename, "video2.mp4");
        assert_eq!(session.uploads[1].filename, "video1.mp4");
    }

    #[test]
    fn test_record_caps_history() {
        let mut session = SessionRecord::new(SessionId::from_string("s"), Some("10.0.0.1".into()));
        for n in 1..=11 {
            session.record(upload(n));
        }

        assert_eq!(session.uploads.len(), MAX_SESSION_UPLOADS);
        assert_eq!(session.uploads[0].filename, "video11.mp4");
        assert_eq!(session.uploads[9].filename, "video2.mp4");
        assert!(session.uploads.iter().all(|u| u.filename != "video1.mp4"));
    }
}
