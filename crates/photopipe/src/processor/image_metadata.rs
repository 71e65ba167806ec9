//! Image fields derived from exiftool output.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::ProcessError;
use crate::media::{field, Value};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};
use crate::tools::metadata;

use super::{cached_probe, is_image};

pub const DEGREE_BY_EXIFTOOL_METADATA: ProcessorDef = ProcessorDef::new(
    "image.degree_by_exiftool_metadata",
    &[field::MEDIA_TYPE, field::METADATA],
    degree_by_exiftool_metadata,
);

pub const SIZE_CAMERA_BY_EXIFTOOL_METADATA: ProcessorDef = ProcessorDef::new(
    "image.size_camera_by_exiftool_metadata",
    &[field::MEDIA_TYPE, field::METADATA],
    size_camera_by_exiftool_metadata,
);

pub const SHOT_AT_BY_EXIFTOOL_METADATA: ProcessorDef = ProcessorDef::new(
    "image.shot_at_by_exiftool_metadata",
    &[field::MEDIA_TYPE, field::METADATA],
    shot_at_by_exiftool_metadata,
);

const KEYS_ORIENTATION: &[&str] = &["EXIF:Orientation", "MakerNotes:CameraOrientation"];

const KEYS_CAMERA: &[&str] = &[
    "EXIF:Model",
    "MakerNotes:CanonImageType",
    "MakerNotes:CanonModelID",
];

// EXIF:ImageWidth is half the real size for Canon CR2 but right for Nikon.
const KEYS_WIDTH: &[&str] = &[
    "File:ImageWidth",
    "PNG:ImageWidth",
    "EXIF:ExifImageWidth",
    "MakerNotes:AFImageWidth",
    "EXIF:ImageWidth",
];

const KEYS_HEIGHT: &[&str] = &[
    "File:ImageHeight",
    "PNG:ImageHeight",
    "EXIF:ExifImageHeight",
    "MakerNotes:AFImageHeight",
    "EXIF:RowsPerStrip",
    "EXIF:ImageHeight",
];

// Most precise first.
const KEYS_SHOT_AT: &[&str] = &[
    "Composite:SubSecCreateDate",
    "Composite:SubSecDateTimeOriginal",
    "Composite:SubSecModifyDate",
    "XMP:DateCreated",
    "EXIF:CreateDate",
    "EXIF:DateTimeOriginal",
    "EXIF:ModifyDate",
    "EXIF:GPSDateStamp",
];

const NO_ROTATION: &str = "Horizontal (normal)";

static ORIENTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Rotate (\d+)( CW)?$").unwrap());

static SHORT_FRACTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(\d{1,5})$").unwrap());

const OFFSET_FORMATS: &[&str] = &[
    "%Y:%m:%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y:%m:%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y:%m:%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y:%m:%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y:%m:%d", "%Y-%m-%d"];

/// Clockwise correction needed to display an image upright.
///
/// `Rotate N` means the camera already rotated the picture by N degrees
/// clockwise, so the correction is the remainder to a full turn;
/// `Rotate N CW` asks for exactly N.
pub fn needed_rotate_degree(orientation: &str) -> Result<i64, ProcessError> {
    if orientation == NO_ROTATION {
        return Ok(0);
    }

    let caps = ORIENTATION
        .captures(orientation)
        .ok_or_else(|| ProcessError::UnsupportedOrientation(orientation.to_string()))?;
    let degree: i64 = caps[1]
        .parse()
        .map_err(|_| ProcessError::UnsupportedOrientation(orientation.to_string()))?;

    if caps.get(2).is_some() {
        Ok(degree)
    } else {
        Ok((360 - degree).rem_euclid(360))
    }
}

/// Parses a shot timestamp as cameras and phones write it.
///
/// Offset-aware formats win. A timestamp without an offset is device-local
/// time and gets localized to `tz`, the server zone; devices that were
/// abroad end up shifted.
pub fn parse_shot_at(value: &str, tz: Tz) -> Result<DateTime<FixedOffset>, ProcessError> {
    let value = value.trim();
    let padded = SHORT_FRACTION.replace(value, |caps: &regex::Captures<'_>| {
        format!(".{:0<6}", &caps[1])
    });

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(&padded, format) {
            return Ok(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&padded) {
        return Ok(parsed);
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&padded, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(&padded, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ProcessError::UnparseableTimestamp(value.to_string()))?;

    tz.from_local_datetime(&naive)
        .single()
        .map(|local| local.fixed_offset())
        .ok_or_else(|| ProcessError::AmbiguousLocalTime(value.to_string()))
}

fn degree_by_exiftool_metadata(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_image(input)? {
        return Ok(Output::Skip);
    }

    let exif = cached_probe(input, "exiftool")?;
    let degree = match metadata::first_filled(&exif, KEYS_ORIENTATION).and_then(metadata::as_text)
    {
        // Unknown orientation: leave it to the user.
        None => Value::Null,
        Some(orientation) => Value::Int(needed_rotate_degree(&orientation)?),
    };
    Ok(Output::pair(field::NEEDED_ROTATE_DEGREE, degree))
}

fn size_camera_by_exiftool_metadata(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_image(input)? {
        return Ok(Output::Skip);
    }

    let exif = cached_probe(input, "exiftool")?;
    let camera = metadata::first_filled(&exif, KEYS_CAMERA)
        .and_then(metadata::as_text)
        .unwrap_or_default();
    let width = metadata::first_filled(&exif, KEYS_WIDTH).and_then(metadata::as_i64);
    let height = metadata::first_filled(&exif, KEYS_HEIGHT).and_then(metadata::as_i64);

    let (Some(width), Some(height)) = (width, height) else {
        return Err(ProcessError::MissingDimensions);
    };

    Ok(Output::pairs([
        (field::CAMERA, Value::from(camera)),
        (field::WIDTH, Value::from(width)),
        (field::HEIGHT, Value::from(height)),
    ]))
}

fn shot_at_by_exiftool_metadata(
    ctx: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_image(input)? {
        return Ok(Output::Skip);
    }

    let exif = cached_probe(input, "exiftool")?;
    match metadata::first_filled(&exif, KEYS_SHOT_AT).and_then(metadata::as_text) {
        Some(text) => Ok(Output::pair(
            field::SHOT_AT,
            parse_shot_at(&text, ctx.settings.timezone)?,
        )),
        None => Ok(Output::Skip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Fields, MediaType};
    use crate::testing::test_context;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn image_with(exif: serde_json::Value) -> Fields {
        Fields::from([
            (field::MEDIA_TYPE.to_string(), Value::from(MediaType::Image)),
            (field::METADATA.to_string(), Value::Json(json!({ "exiftool": exif }))),
        ])
    }

    #[test]
    fn test_needed_rotate_degree() {
        assert_eq!(needed_rotate_degree("Horizontal (normal)").unwrap(), 0);
        assert_eq!(needed_rotate_degree("Rotate 90 CW").unwrap(), 90);
        assert_eq!(needed_rotate_degree("Rotate 90").unwrap(), 270);
        assert_eq!(needed_rotate_degree("Rotate 180").unwrap(), 180);
        assert_eq!(needed_rotate_degree("Rotate 270 CW").unwrap(), 270);
    }

    #[test]
    fn test_unsupported_orientation_is_fatal() {
        let err = needed_rotate_degree("Mirror horizontal").unwrap_err();
        assert!(matches!(err, ProcessError::UnsupportedOrientation(s) if s == "Mirror horizontal"));
    }

    #[test]
    fn test_parse_offset_aware() {
        let parsed = parse_shot_at("2016-10-22T14:39:13+0200", Tz::UTC).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2016-10-22T14:39:13+02:00");

        let parsed = parse_shot_at("2016:11:06 14:29:25.018+01:00", Tz::UTC).unwrap();
        assert_eq!(parsed.nanosecond(), 18_000_000);
        assert_eq!(parsed.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_parse_pads_short_fraction() {
        let parsed = parse_shot_at("2016:11:06 14:29:25.018", Tz::UTC).unwrap();
        assert_eq!(parsed.timestamp_subsec_micros(), 18_000);
    }

    #[test]
    fn test_parse_naive_localizes_to_server_zone() {
        let parsed = parse_shot_at("2016:10:19 21:08:00", chrono_tz::Europe::Berlin).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2016-10-19T21:08:00+02:00");
    }

    #[test]
    fn test_parse_rfc3339_utc() {
        let parsed = parse_shot_at("2015-04-18T13:42:19.000000Z", Tz::UTC).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        assert_eq!(parsed.hour(), 13);
    }

    #[test]
    fn test_parse_date_only() {
        let parsed = parse_shot_at("2016:10:22", Tz::UTC).unwrap();
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (2016, 10, 22));
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn test_parse_nonexistent_local_time() {
        // Clocks jumped from 02:00 to 03:00 that night.
        let err = parse_shot_at("2016:03:27 02:30:00", chrono_tz::Europe::Berlin).unwrap_err();
        assert!(matches!(err, ProcessError::AmbiguousLocalTime(_)));
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_shot_at("yesterday", Tz::UTC).unwrap_err();
        assert!(matches!(err, ProcessError::UnparseableTimestamp(s) if s == "yesterday"));
    }

    #[test]
    fn test_degree_absent_orientation_is_null() {
        let (_dir, ctx) = test_context();
        let fields = image_with(json!({"EXIF:Model": "X"}));
        let output = degree_by_exiftool_metadata(&ctx, &Input::from_fields(&fields)).unwrap();
        assert_eq!(output, Output::pair(field::NEEDED_ROTATE_DEGREE, Value::Null));
    }

    #[test]
    fn test_degree_uses_maker_notes_fallback() {
        let (_dir, ctx) = test_context();
        let fields = image_with(json!({"MakerNotes:CameraOrientation": "Rotate 90 CW"}));
        let output = degree_by_exiftool_metadata(&ctx, &Input::from_fields(&fields)).unwrap();
        assert_eq!(output, Output::pair(field::NEEDED_ROTATE_DEGREE, 90i64));
    }

    #[test]
    fn test_size_camera() {
        let (_dir, ctx) = test_context();
        let fields = image_with(json!({
            "File:ImageWidth": 4000,
            "File:ImageHeight": "3000",
            "EXIF:Model": "",
            "MakerNotes:CanonImageType": "Canon EOS 5D"
        }));
        let output = size_camera_by_exiftool_metadata(&ctx, &Input::from_fields(&fields))
            .unwrap()
            .into_fields();
        assert_eq!(output[field::WIDTH], Value::Int(4000));
        assert_eq!(output[field::HEIGHT], Value::Int(3000));
        assert_eq!(output[field::CAMERA], Value::from("Canon EOS 5D"));
    }

    #[test]
    fn test_size_required() {
        let (_dir, ctx) = test_context();
        let fields = image_with(json!({"File:ImageWidth": 4000}));
        let err = size_camera_by_exiftool_metadata(&ctx, &Input::from_fields(&fields)).unwrap_err();
        assert!(matches!(err, ProcessError::MissingDimensions));
    }

    #[test]
    fn test_shot_at_picks_most_precise_key() {
        let (_dir, ctx) = test_context();
        let fields = image_with(json!({
            "EXIF:DateTimeOriginal": "2016:10:22 14:39:13",
            "Composite:SubSecDateTimeOriginal": "2016:10:22 14:39:13.52+02:00"
        }));
        let output = shot_at_by_exiftool_metadata(&ctx, &Input::from_fields(&fields))
            .unwrap()
            .into_fields();
        let shot_at = output[field::SHOT_AT].as_timestamp().unwrap();
        assert_eq!(shot_at.timestamp_subsec_micros(), 520_000);
    }

    #[test]
    fn test_video_is_skipped() {
        let (_dir, ctx) = test_context();
        let fields = Fields::from([
            (field::MEDIA_TYPE.to_string(), Value::from(MediaType::Video)),
            (field::METADATA.to_string(), Value::Null),
        ]);
        let input = Input::from_fields(&fields);
        assert_eq!(degree_by_exiftool_metadata(&ctx, &input).unwrap(), Output::Skip);
        assert_eq!(size_camera_by_exiftool_metadata(&ctx, &input).unwrap(), Output::Skip);
        assert_eq!(shot_at_by_exiftool_metadata(&ctx, &input).unwrap(), Output::Skip);
    }
}
