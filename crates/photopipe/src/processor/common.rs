//! Classification and probing shared by every media type.

use serde_json::Value as Json;
use tracing::debug;

use crate::error::{ProcessError, StorageError};
use crate::media::{field, MediaType, Value};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};
use crate::sanitize;
use crate::tools::ProbeTool;

use super::{cached_probe, is_visual};

pub const MIMETYPE_BY_CONTENT: ProcessorDef =
    ProcessorDef::new("common.mimetype_by_content", &[field::CONTENT], mimetype_by_content);

pub const MEDIA_TYPE_BY_MIMETYPE: ProcessorDef = ProcessorDef::new(
    "common.media_type_by_mimetype",
    &[field::MIMETYPE],
    media_type_by_mimetype,
);

pub const EXIFTOOL_METADATA_BY_CONTENT: ProcessorDef = ProcessorDef::new(
    "common.exiftool_metadata_by_content",
    &[field::CONTENT, field::MEDIA_TYPE, field::METADATA],
    exiftool_metadata_by_content,
);

pub const MIMETYPE_BY_EXIFTOOL_METADATA: ProcessorDef = ProcessorDef::new(
    "common.mimetype_by_exiftool_metadata",
    &[field::MEDIA_TYPE, field::METADATA],
    mimetype_by_exiftool_metadata,
);

pub const SHOW_AT_BY_SHOT_AT_SOURCE_LASTMODIFIED: ProcessorDef = ProcessorDef::new(
    "common.show_at_by_shot_at_source_lastmodified",
    &[field::SHOT_AT, field::SOURCE_LASTMODIFIED],
    show_at_by_shot_at_source_lastmodified,
);

const UNKNOWN_MIMETYPE: &str = "application/octet-stream";

/// Sniffs the MIME type from the leading bytes of the stored content.
fn mimetype_by_content(ctx: &ProcessingContext, input: &Input<'_>) -> Result<Output, ProcessError> {
    let path = ctx.content.absolute(input.required_path(field::CONTENT)?)?;
    let kind = infer::get_from_path(&path).map_err(|source| StorageError::ReadFile {
        path: path.clone(),
        source,
    })?;

    let mimetype = kind.map(|k| k.mime_type()).unwrap_or(UNKNOWN_MIMETYPE);
    debug!(file = %sanitize::redact_path(&path), mimetype, "sniffed content");
    Ok(Output::pair(field::MIMETYPE, mimetype))
}

fn media_type_by_mimetype(_: &ProcessingContext, input: &Input<'_>) -> Result<Output, ProcessError> {
    let mimetype = input.optional_str(field::MIMETYPE)?.unwrap_or_default();
    Ok(Output::pair(field::MEDIA_TYPE, MediaType::from_mimetype(mimetype)))
}

/// Runs exiftool on images and videos and caches the result as
/// `metadata.exiftool`, keeping whatever else `metadata` holds.
fn exiftool_metadata_by_content(
    ctx: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_visual(input)? {
        return Ok(Output::Skip);
    }

    let path = ctx.content.absolute(input.required_path(field::CONTENT)?)?;
    let exif = ctx.tools.run_probe(ProbeTool::Exiftool, &path)?;

    let mut metadata = input.json_object(field::METADATA)?;
    metadata.insert("exiftool".to_string(), exif);
    Ok(Output::pair(field::METADATA, Json::Object(metadata)))
}

/// exiftool knows more formats than content sniffing; a non-empty
/// `File:MIMEType` wins.
fn mimetype_by_exiftool_metadata(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_visual(input)? {
        return Ok(Output::Skip);
    }

    let exif = cached_probe(input, "exiftool")?;
    match exif.get("File:MIMEType").and_then(Json::as_str) {
        Some(mimetype) if !mimetype.is_empty() => Ok(Output::pair(field::MIMETYPE, mimetype)),
        _ => Ok(Output::Skip),
    }
}

fn show_at_by_shot_at_source_lastmodified(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    let show_at = match input.optional_timestamp(field::SHOT_AT)? {
        Some(shot_at) => Some(shot_at),
        None => input.optional_timestamp(field::SOURCE_LASTMODIFIED)?,
    };
    Ok(Output::pair(field::SHOW_AT, Value::from(show_at)))
}
