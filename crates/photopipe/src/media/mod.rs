//! Media record vocabulary: field values, media kinds, categories and
//! the persisted field names shared by processors and the record store.

pub mod kinds;
pub mod value;

pub use kinds::{Category, MediaType};
pub use value::{Fields, Value};

/// Stable identifier of a media record.
pub type RecordId = i64;

/// Names of persisted record fields.
pub mod field {
    pub const UPLOADER_ID: &str = "uploader_id";
    pub const SESSION_ID: &str = "session_id";
    pub const MEDIA_TYPE: &str = "media_type";
    pub const SHOT_AT: &str = "shot_at";
    pub const SHOW_AT: &str = "show_at";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const DURATION: &str = "duration";
    pub const CONTENT: &str = "content";
    pub const SIZE_BYTES: &str = "size_bytes";
    pub const NEEDED_ROTATE_DEGREE: &str = "needed_rotate_degree";
    pub const CATEGORIES: &str = "categories";
    pub const PROCESSING_STATE_CODE: &str = "processing_state_code";
    pub const MIMETYPE: &str = "mimetype";
    pub const SOURCE_FILENAME: &str = "source_filename";
    pub const SOURCE_LASTMODIFIED: &str = "source_lastmodified";
    pub const SHA1_HEX: &str = "sha1_hex";
    pub const SCREENSHOT: &str = "screenshot";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const THUMBNAIL_WIDTH: &str = "thumbnail_width";
    pub const THUMBNAIL_HEIGHT: &str = "thumbnail_height";
    pub const METADATA: &str = "metadata";
    pub const SHOT_ID: &str = "shot_id";
    pub const CAMERA: &str = "camera";
    pub const GPS_LATITUDE: &str = "gps_latitude";
    pub const GPS_LONGITUDE: &str = "gps_longitude";
    pub const GPS_ALTITUDE_M: &str = "gps_altitude_m";
}

/// Keys the engine and its callers place in the working set themselves.
pub mod injected {
    /// Identifier of the record being processed, supplied by the caller.
    pub const RECORD_ID: &str = "record_id";
    /// Names of every field the pipeline needs loaded.
    pub const ARGS: &str = "ARGS";
    /// Snapshot of the fields as they were loaded.
    pub const INITIAL_STATE: &str = "INITIAL_STATE";

    pub const ALL: [&str; 3] = [RECORD_ID, ARGS, INITIAL_STATE];

    pub fn contains(name: &str) -> bool {
        ALL.contains(&name)
    }
}
