//! Representative still frame for videos.

use std::path::PathBuf;

use tracing::debug;

use crate::error::ProcessError;
use crate::media::{field, injected};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};

use super::is_video;
use super::thumbnail::{decode, encode_jpeg};

pub const SCREENSHOT_BY_DURATION_CONTENT: ProcessorDef = ProcessorDef::new(
    "video.screenshot_by_duration_content",
    &[
        injected::RECORD_ID,
        field::UPLOADER_ID,
        field::MEDIA_TYPE,
        field::DURATION,
        field::CONTENT,
    ],
    screenshot_by_duration_content,
);

/// Offset of the frame to grab: a third into the video, capped at
/// `screenshot_second`.
pub fn screenshot_offset(duration_secs: f64, screenshot_second: u32) -> u32 {
    let third = (duration_secs / 3.0).floor().max(0.0) as u32;
    third.min(screenshot_second)
}

fn screenshot_by_duration_content(
    ctx: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_video(input)? {
        return Ok(Output::Skip);
    }

    let record_id = input.record_id()?;
    let uploader_id = input.required_i64(field::UPLOADER_ID)?;
    let duration = input
        .optional_duration(field::DURATION)?
        .ok_or(ProcessError::InvalidInput {
            field: field::DURATION,
            expected: "duration",
        })?;
    let offset = screenshot_offset(
        duration.num_milliseconds() as f64 / 1000.0,
        ctx.settings.screenshot_second,
    );

    let content = ctx.content.absolute(input.required_path(field::CONTENT)?)?;
    let frame = ctx.tools.screenshot(&content, offset)?;
    // ffmpeg output is normalized through the decoder so the stored file is
    // always a baseline JPEG
    let bytes = encode_jpeg(&decode(&frame)?, ctx.settings.thumbnail_quality)?;

    let target = PathBuf::from("screenshot")
        .join(uploader_id.to_string())
        .join(format!("{record_id}.jpg"));
    let stored = ctx.content.write(&target, &bytes)?;
    debug!(record_id, offset, "stored screenshot");

    Ok(Output::pair(field::SCREENSHOT, stored))
}
