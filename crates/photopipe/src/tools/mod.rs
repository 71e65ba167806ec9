//! External probe and codec tools (`exiftool`, `ffprobe`, `ffmpeg`).

pub mod command;
pub mod error;
pub mod metadata;

use std::path::Path;

pub use command::CommandTools;
pub use error::ProbeError;

/// Metadata extractors that answer with JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeTool {
    Exiftool,
    Ffprobe,
}

impl ProbeTool {
    pub fn name(self) -> &'static str {
        match self {
            ProbeTool::Exiftool => "exiftool",
            ProbeTool::Ffprobe => "ffprobe",
        }
    }
}

pub trait MediaTools: Send + Sync {
    /// Runs a probe over `path` and returns its JSON description.
    fn run_probe(&self, tool: ProbeTool, path: &Path) -> Result<serde_json::Value, ProbeError>;

    /// Extracts a binary resource (e.g. `PreviewImage`) embedded in `path`.
    fn extract_embedded(&self, path: &Path, resource: &str) -> Result<Vec<u8>, ProbeError>;

    /// Grabs one video frame at `offset_seconds`, encoded as JPEG.
    fn screenshot(&self, path: &Path, offset_seconds: u32) -> Result<Vec<u8>, ProbeError>;
}
