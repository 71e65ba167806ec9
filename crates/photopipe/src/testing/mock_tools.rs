use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value as Json;

use crate::tools::{MediaTools, ProbeError, ProbeTool};

/// Scripted [`MediaTools`]: every call answers with the configured bytes
/// or JSON regardless of the path, and anything unconfigured fails with
/// [`ProbeError::EmptyOutput`].
#[derive(Debug, Clone, Default)]
pub struct MockTools {
    probes: HashMap<ProbeTool, Json>,
    embedded: HashMap<String, Vec<u8>>,
    screenshot: Option<Vec<u8>>,
    screenshot_offsets: Arc<Mutex<Vec<u32>>>,
}

impl MockTools {
    pub fn with_exiftool(mut self, exif: Json) -> Self {
        self.probes.insert(ProbeTool::Exiftool, exif);
        self
    }

    pub fn with_ffprobe(mut self, probe: Json) -> Self {
        self.probes.insert(ProbeTool::Ffprobe, probe);
        self
    }

    pub fn with_embedded(mut self, tag: &str, bytes: Vec<u8>) -> Self {
        self.embedded.insert(tag.to_string(), bytes);
        self
    }

    pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot = Some(bytes);
        self
    }

    /// Offsets every screenshot was requested at, in call order.
    pub fn screenshot_offsets(&self) -> Vec<u32> {
        self.screenshot_offsets
            .lock()
            .map(|offsets| offsets.clone())
            .unwrap_or_default()
    }
}

fn empty(tool: &str) -> ProbeError {
    ProbeError::EmptyOutput {
        command: tool.to_string(),
    }
}

impl MediaTools for MockTools {
    fn run_probe(&self, tool: ProbeTool, _path: &Path) -> Result<Json, ProbeError> {
        self.probes
            .get(&tool)
            .cloned()
            .ok_or_else(|| empty(tool.name()))
    }

    fn extract_embedded(&self, _path: &Path, resource: &str) -> Result<Vec<u8>, ProbeError> {
        self.embedded
            .get(resource)
            .cloned()
            .ok_or_else(|| empty("exiftool"))
    }

    fn screenshot(&self, _path: &Path, offset_seconds: u32) -> Result<Vec<u8>, ProbeError> {
        if let Ok(mut offsets) = self.screenshot_offsets.lock() {
            offsets.push(offset_seconds);
        }
        self.screenshot.clone().ok_or_else(|| empty("ffmpeg"))
    }
}
