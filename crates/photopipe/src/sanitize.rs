//! Helpers for sanitizing data before it enters log lines and span fields.
//!
//! Uploads carry user file names and directory layouts; only the parts
//! needed for debugging end up in traces.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Shortens a content digest to a prefix long enough to correlate log lines.
pub fn short_digest(hex: &str) -> &str {
    hex.get(..8).unwrap_or(hex)
}
