//! Record store contract used by processors, the state machine and intake.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::media::{field, Fields, RecordId, Value};

/// Which records a bulk lookup selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    All,
    /// Records whose last stage failed (negative state code).
    Failed,
}

/// A record sharing a shot time with another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotPeer {
    pub id: RecordId,
    pub shot_id: Option<i64>,
}

/// Fields known when an upload is accepted.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub uploader_id: i64,
    pub session_id: Uuid,
    /// Content path relative to the content root.
    pub content: PathBuf,
    pub size_bytes: i64,
    pub sha1_hex: String,
    pub mimetype: String,
    pub source_filename: String,
    pub source_lastmodified: Option<DateTime<FixedOffset>>,
}

pub trait RecordStore: Send + Sync {
    /// Loads the named fields of a record. Unknown names are an error.
    fn fetch(&self, id: RecordId, fields: &BTreeSet<String>) -> Result<Fields, DatabaseError>;

    /// Writes exactly the given fields.
    fn persist(&self, id: RecordId, changed: &Fields) -> Result<(), DatabaseError>;

    fn set_state_code(&self, id: RecordId, code: i32) -> Result<(), DatabaseError> {
        let changed = Fields::from([(
            field::PROCESSING_STATE_CODE.to_string(),
            Value::Int(i64::from(code)),
        )]);
        self.persist(id, &changed)
    }

    fn ids(&self, filter: RecordFilter) -> Result<Vec<RecordId>, DatabaseError>;

    fn create(&self, media: &NewMedia) -> Result<RecordId, DatabaseError>;

    fn find_duplicate(
        &self,
        uploader_id: i64,
        sha1_hex: &str,
        size_bytes: i64,
    ) -> Result<Option<RecordId>, DatabaseError>;

    /// Every record shot at exactly this instant, including the caller's.
    fn find_by_shot_at(&self, shot_at: &DateTime<FixedOffset>) -> Result<Vec<ShotPeer>, DatabaseError>;

    fn assign_shot(&self, ids: &[RecordId], shot_id: i64) -> Result<(), DatabaseError>;

    fn next_sequence_value(&self, name: &str) -> Result<i64, DatabaseError>;
}
