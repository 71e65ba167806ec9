//! Media event broadcasting for real-time progress streaming.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::media::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaEventKind {
    /// A thumbnail was written (or could not be produced).
    ThumbnailReady { thumbnail: Option<String> },
    StageCompleted { code: i32 },
    StageFailed { code: i32, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaEvent {
    pub timestamp: DateTime<Utc>,
    pub uploader_id: Option<i64>,
    pub record_id: RecordId,
    #[serde(flatten)]
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(record_id: RecordId, uploader_id: Option<i64>, kind: MediaEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            uploader_id,
            record_id,
            kind,
        }
    }

    pub fn stage_completed(record_id: RecordId, code: i32) -> Self {
        Self::new(record_id, None, MediaEventKind::StageCompleted { code })
    }

    pub fn stage_failed(record_id: RecordId, code: i32, error: &str) -> Self {
        Self::new(
            record_id,
            None,
            MediaEventKind::StageFailed {
                code,
                error: error.to_string(),
            },
        )
    }
}

#[derive(Clone)]
pub struct MediaEventBroadcaster {
    sender: broadcast::Sender<MediaEvent>,
}

impl MediaEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, event: MediaEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.sender.subscribe()
    }
}

impl Default for MediaEventBroadcaster {
    fn default() -> Self {
        Self::new(1000)
    }
}
