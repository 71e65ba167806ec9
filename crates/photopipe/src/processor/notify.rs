//! Events for listeners that wait on a record's progress.

use crate::broadcast::{MediaEvent, MediaEventKind};
use crate::error::ProcessError;
use crate::media::{field, injected};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};

pub const THUMBNAIL_READY: ProcessorDef = ProcessorDef::new(
    "notify.thumbnail_ready",
    &[injected::RECORD_ID, field::UPLOADER_ID, field::THUMBNAIL],
    thumbnail_ready,
);

/// Runs after `record.save`, so listeners only hear about persisted state.
fn thumbnail_ready(ctx: &ProcessingContext, input: &Input<'_>) -> Result<Output, ProcessError> {
    let thumbnail = input
        .optional_path(field::THUMBNAIL)?
        .map(|p| p.to_string_lossy().into_owned());

    ctx.notify(MediaEvent::new(
        input.record_id()?,
        input.optional_i64(field::UPLOADER_ID)?,
        MediaEventKind::ThumbnailReady { thumbnail },
    ));
    Ok(Output::Skip)
}
