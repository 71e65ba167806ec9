//! Broadcasting of media events for real-time progress streaming.

pub mod media_events;

pub use media_events::{MediaEvent, MediaEventBroadcaster, MediaEventKind};
