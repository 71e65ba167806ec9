use std::sync::Arc;

use chrono_tz::Tz;

use crate::broadcast::{MediaEvent, MediaEventBroadcaster};
use crate::config::Config;
use crate::storage::{ContentStorage, RecordStore};
use crate::tools::MediaTools;

/// Tunables the processor library reads while running.
#[derive(Debug, Clone)]
pub struct ProcessingSettings {
    /// Zone used to localize timestamps that carry no offset.
    pub timezone: Tz,
    /// Bounding box edge for thumbnails, in pixels.
    pub thumbnail_size: u32,
    pub thumbnail_quality: u8,
    /// Upper bound for the video screenshot offset, in seconds.
    pub screenshot_second: u32,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            thumbnail_size: 160,
            thumbnail_quality: 95,
            screenshot_second: 10,
        }
    }
}

impl ProcessingSettings {
    /// The timezone must already have been validated by the config loader.
    pub fn from_config(config: &Config) -> Self {
        Self {
            timezone: config.timezone.parse().unwrap_or(Tz::UTC),
            thumbnail_size: config.thumbnail.size,
            thumbnail_quality: config.thumbnail.quality,
            screenshot_second: config.screenshot_second,
        }
    }
}

/// Collaborators shared by every processor in every run.
#[derive(Clone)]
pub struct ProcessingContext {
    pub records: Arc<dyn RecordStore>,
    pub content: Arc<ContentStorage>,
    pub tools: Arc<dyn MediaTools>,
    pub settings: ProcessingSettings,
    pub events: Option<MediaEventBroadcaster>,
}

impl ProcessingContext {
    pub fn new(
        records: Arc<dyn RecordStore>,
        content: Arc<ContentStorage>,
        tools: Arc<dyn MediaTools>,
        settings: ProcessingSettings,
    ) -> Self {
        Self {
            records,
            content,
            tools,
            settings,
            events: None,
        }
    }

    pub fn with_events(mut self, events: MediaEventBroadcaster) -> Self {
        self.events = Some(events);
        self
    }

    pub fn notify(&self, event: MediaEvent) {
        if let Some(events) = &self.events {
            events.send(event);
        }
    }
}
