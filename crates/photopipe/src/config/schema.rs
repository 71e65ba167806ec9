use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Falls back to `~/.photopipe/data/photopipe.db` when unset.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    pub media_root: PathBuf,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
    #[serde(default = "default_screenshot_second")]
    pub screenshot_second: u32,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_screenshot_second() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    #[serde(default = "default_thumbnail_size")]
    pub size: u32,
    #[serde(default = "default_thumbnail_quality")]
    pub quality: u8,
}

fn default_thumbnail_size() -> u32 {
    160
}

fn default_thumbnail_quality() -> u8 {
    95
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: default_thumbnail_size(),
            quality: default_thumbnail_quality(),
        }
    }
}

/// Executables used for probing and frame extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_exiftool")]
    pub exiftool: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
}

fn default_exiftool() -> String {
    "exiftool".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            exiftool: default_exiftool(),
            ffprobe: default_ffprobe(),
            ffmpeg: default_ffmpeg(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Buffered media events per subscriber before the slowest one lags.
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

fn default_event_capacity() -> usize {
    1000
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl Config {
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(crate::db::default_database_path)
    }
}
