//! Video fields derived from ffprobe output.

use chrono::TimeDelta;
use serde_json::Value as Json;

use crate::error::ProcessError;
use crate::media::{field, Value};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};
use crate::tools::{metadata, ProbeTool};

use super::image_metadata::parse_shot_at;
use super::{cached_probe, is_video};

pub const FFPROBE_METADATA_BY_CONTENT: ProcessorDef = ProcessorDef::new(
    "video.ffprobe_metadata_by_content",
    &[field::MEDIA_TYPE, field::CONTENT, field::METADATA],
    ffprobe_metadata_by_content,
);

pub const DURATION_SIZE_BY_FFPROBE_METADATA: ProcessorDef = ProcessorDef::new(
    "video.duration_size_by_ffprobe_metadata",
    &[field::MEDIA_TYPE, field::METADATA],
    duration_size_by_ffprobe_metadata,
);

pub const DEGREE_BY_FFPROBE_METADATA: ProcessorDef = ProcessorDef::new(
    "video.degree_by_ffprobe_metadata",
    &[field::MEDIA_TYPE],
    degree_by_ffprobe_metadata,
);

pub const CAMERA_BY_FFPROBE_METADATA: ProcessorDef = ProcessorDef::new(
    "video.camera_by_ffprobe_metadata",
    &[field::MEDIA_TYPE, field::METADATA],
    camera_by_ffprobe_metadata,
);

pub const SHOT_AT_BY_FFPROBE_METADATA: ProcessorDef = ProcessorDef::new(
    "video.shot_at_by_ffprobe_metadata",
    &[field::MEDIA_TYPE, field::METADATA],
    shot_at_by_ffprobe_metadata,
);

const KEY_CAMERA: &str = "format:tags:com.apple.quicktime.model";

const KEYS_SHOT_AT: &[&str] = &[
    "format:tags:com.apple.quicktime.creationdate",
    "format:tags:creation_time",
];

/// The single video stream of a probe result.
pub fn video_stream(ffprobe: &Json) -> Result<&Json, ProcessError> {
    let streams: Vec<&Json> = ffprobe
        .get("streams")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
        .filter(|s| s.get("codec_type").and_then(Json::as_str) == Some("video"))
        .collect();

    match streams.as_slice() {
        [] => Err(ProcessError::NoVideoStream),
        [stream] => Ok(stream),
        many => Err(ProcessError::MultipleVideoStreams(many.len())),
    }
}

fn ffprobe_metadata_by_content(
    ctx: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_video(input)? {
        return Ok(Output::Skip);
    }

    let path = ctx.content.absolute(input.required_path(field::CONTENT)?)?;
    let probe = ctx.tools.run_probe(ProbeTool::Ffprobe, &path)?;

    let mut metadata = input.json_object(field::METADATA)?;
    metadata.insert("ffprobe".to_string(), probe);
    Ok(Output::pair(field::METADATA, Json::Object(metadata)))
}

fn duration_size_by_ffprobe_metadata(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_video(input)? {
        return Ok(Output::Skip);
    }

    let ffprobe = cached_probe(input, "ffprobe")?;
    let stream = video_stream(&ffprobe)?;

    let seconds = stream
        .get("duration")
        .and_then(metadata::as_f64)
        .ok_or(ProcessError::InvalidInput {
            field: field::METADATA,
            expected: "video stream duration",
        })?;
    let duration = TimeDelta::microseconds((seconds * 1_000_000.0).round() as i64);

    let width = stream.get("width").and_then(metadata::as_i64).filter(|w| *w > 0);
    let height = stream.get("height").and_then(metadata::as_i64).filter(|h| *h > 0);
    let (Some(width), Some(height)) = (width, height) else {
        return Err(ProcessError::MissingDimensions);
    };

    Ok(Output::pairs([
        (field::DURATION, Value::from(duration)),
        (field::WIDTH, Value::from(width)),
        (field::HEIGHT, Value::from(height)),
    ]))
}

/// ffmpeg applies the rotation itself when decoding frames.
fn degree_by_ffprobe_metadata(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_video(input)? {
        return Ok(Output::Skip);
    }
    Ok(Output::pair(field::NEEDED_ROTATE_DEGREE, 0i64))
}

fn camera_by_ffprobe_metadata(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_video(input)? {
        return Ok(Output::Skip);
    }

    let ffprobe = cached_probe(input, "ffprobe")?;
    let camera = metadata::resolve_path(&ffprobe, KEY_CAMERA)
        .and_then(metadata::as_text)
        .unwrap_or_default();
    Ok(Output::pair(field::CAMERA, camera))
}

fn shot_at_by_ffprobe_metadata(
    ctx: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_video(input)? {
        return Ok(Output::Skip);
    }

    let ffprobe = cached_probe(input, "ffprobe")?;
    let from_format = metadata::first_filled_path(&ffprobe, KEYS_SHOT_AT);
    let from_streams = || {
        ffprobe
            .get("streams")
            .and_then(Json::as_array)
            .into_iter()
            .flatten()
            .filter_map(|stream| metadata::resolve_path(stream, "tags:creation_time"))
            .find(|value| metadata::is_filled(value))
    };

    match from_format.or_else(from_streams).and_then(metadata::as_text) {
        Some(text) => Ok(Output::pair(
            field::SHOT_AT,
            parse_shot_at(&text, ctx.settings.timezone)?,
        )),
        None => Ok(Output::Skip),
    }
}
