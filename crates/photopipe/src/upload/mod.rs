//! Intake: turns a validated upload into a record and starts processing.

pub mod form;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::db::DatabaseError;
use crate::error::UploadError;
use crate::media::{field, RecordId, Value};
use crate::processing::states::INITIAL_JOB;
use crate::sanitize;
use crate::storage::{ContentStorage, NewMedia, RecordStore};
use crate::worker::{JobScheduler, StageJob};

pub use form::{file_digest, UploadForm, ValidatedUpload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Created(RecordId),
    /// The uploader already sent identical content.
    Duplicate(RecordId),
}

impl UploadOutcome {
    pub fn record_id(self) -> RecordId {
        match self {
            UploadOutcome::Created(id) | UploadOutcome::Duplicate(id) => id,
        }
    }
}

pub struct Intake {
    records: Arc<dyn RecordStore>,
    content: Arc<ContentStorage>,
    scheduler: Arc<dyn JobScheduler>,
}

impl Intake {
    pub fn new(
        records: Arc<dyn RecordStore>,
        content: Arc<ContentStorage>,
        scheduler: Arc<dyn JobScheduler>,
    ) -> Self {
        Self {
            records,
            content,
            scheduler,
        }
    }

    /// Validates `form`, moves the file into the content store and
    /// enqueues the first stage.
    ///
    /// A duplicate leaves the uploaded file where it is and returns the
    /// existing record.
    pub fn accept(&self, form: &UploadForm) -> Result<UploadOutcome, UploadError> {
        let upload = form.validate()?;
        let size_bytes = i64::try_from(upload.size_bytes).map_err(|_| UploadError::SizeMismatch {
            declared: form.size,
            actual: upload.size_bytes,
        })?;

        if let Some(existing) =
            self.records
                .find_duplicate(upload.uploader_id, &upload.sha1_hex, size_bytes)?
        {
            info!(
                record_id = existing,
                sha1 = sanitize::short_digest(&upload.sha1_hex),
                "duplicate upload"
            );
            return Ok(UploadOutcome::Duplicate(existing));
        }

        let relative = PathBuf::from("content")
            .join(upload.uploader_id.to_string())
            .join(format!("{}_{}", upload.sha1_hex, upload.size_bytes));
        let content = self.content.import(&upload.file, &relative)?;

        let created = self.records.create(&NewMedia {
            uploader_id: upload.uploader_id,
            session_id: upload.session_id,
            content: content.clone(),
            size_bytes,
            sha1_hex: upload.sha1_hex.clone(),
            mimetype: upload.mimetype,
            source_filename: upload.source_filename,
            source_lastmodified: upload.source_lastmodified,
        });
        let id = match created {
            Ok(id) => id,
            Err(e) => {
                return self.abandon(
                    &content,
                    &upload.sha1_hex,
                    upload.uploader_id,
                    size_bytes,
                    e,
                )
            }
        };
        self.scheduler.enqueue(StageJob::new(INITIAL_JOB, id))?;

        info!(
            record_id = id,
            uploader_id = upload.uploader_id,
            sha1 = sanitize::short_digest(&upload.sha1_hex),
            "accepted upload"
        );
        Ok(UploadOutcome::Created(id))
    }

    /// Cleans up after `create` failed on an already imported file.
    ///
    /// A concurrent identical upload that won the race turns this one into
    /// a duplicate. The imported copy is only kept when the winner's record
    /// still points at the same path.
    fn abandon(
        &self,
        imported: &Path,
        sha1_hex: &str,
        uploader_id: i64,
        size_bytes: i64,
        cause: DatabaseError,
    ) -> Result<UploadOutcome, UploadError> {
        let winner = self
            .records
            .find_duplicate(uploader_id, sha1_hex, size_bytes)
            .ok()
            .flatten();

        let Some(existing) = winner else {
            self.discard(imported);
            return Err(cause.into());
        };

        let wanted = BTreeSet::from([field::CONTENT.to_string()]);
        let shared = self
            .records
            .fetch(existing, &wanted)
            .ok()
            .and_then(|mut f| f.remove(field::CONTENT))
            .is_some_and(|v| v == Value::File(imported.to_path_buf()));
        if !shared {
            self.discard(imported);
        }

        info!(
            record_id = existing,
            sha1 = sanitize::short_digest(sha1_hex),
            "duplicate upload raced an identical one"
        );
        Ok(UploadOutcome::Duplicate(existing))
    }

    fn discard(&self, imported: &Path) {
        if let Err(e) = self.content.remove(imported) {
            warn!(error = %e, "failed to remove abandoned upload");
        }
    }
}
