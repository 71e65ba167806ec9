use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::error::UploadError;

static SHA1_HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").unwrap());

/// What a client declares about a file it uploaded.
///
/// The bytes themselves are already on disk at `file`; nothing here is
/// trusted until [`UploadForm::validate`] has checked it against them.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub uploader_id: i64,
    pub session_id: Uuid,
    /// Lowercase hex SHA-1 the client computed.
    pub sha1: String,
    pub size: u64,
    /// Client-side modification time, milliseconds since the epoch.
    pub last_modified_ms: Option<i64>,
    pub name: String,
    /// MIME type the client claimed, if any.
    pub mimetype: Option<String>,
    pub file: PathBuf,
}

/// An upload whose declared digest and size match its content.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpload {
    pub uploader_id: i64,
    pub session_id: Uuid,
    pub sha1_hex: String,
    pub size_bytes: u64,
    pub source_lastmodified: Option<DateTime<FixedOffset>>,
    /// Base name only; any directory part the client sent is dropped.
    pub source_filename: String,
    pub mimetype: String,
    pub file: PathBuf,
}

impl UploadForm {
    pub fn validate(&self) -> Result<ValidatedUpload, UploadError> {
        if !SHA1_HEX.is_match(&self.sha1) {
            return Err(UploadError::InvalidHash(self.sha1.clone()));
        }

        let source_lastmodified = self
            .last_modified_ms
            .map(|ms| {
                (ms >= 0)
                    .then(|| DateTime::from_timestamp_millis(ms))
                    .flatten()
                    .map(|utc| utc.fixed_offset())
                    .ok_or(UploadError::InvalidTimestamp(ms))
            })
            .transpose()?;

        let (computed, actual) = file_digest(&self.file)?;
        if computed != self.sha1 {
            return Err(UploadError::HashMismatch {
                declared: self.sha1.clone(),
                computed,
            });
        }
        if actual != self.size {
            return Err(UploadError::SizeMismatch {
                declared: self.size,
                actual,
            });
        }

        Ok(ValidatedUpload {
            uploader_id: self.uploader_id,
            session_id: self.session_id,
            sha1_hex: computed,
            size_bytes: actual,
            source_lastmodified,
            source_filename: base_name(&self.name),
            mimetype: self.mimetype.clone().unwrap_or_default(),
            file: self.file.clone(),
        })
    }
}

fn base_name(name: &str) -> String {
    // clients on Windows send backslash-separated paths
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
    Path::new(last)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Streams the file through SHA-1 and returns `(hex digest, bytes read)`.
pub fn file_digest(path: &Path) -> Result<(String, u64), UploadError> {
    let read_err = |source| UploadError::ReadFile {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(read_err)?;
    let mut hasher = Sha1::new();
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf).map_err(read_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((hex::encode(hasher.finalize()), total))
}
