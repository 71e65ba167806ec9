//! GPS position from exiftool's human-readable coordinates.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ProcessError;
use crate::media::{field, Value};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};
use crate::tools::metadata;

use super::cached_probe;

pub const GPS_BY_EXIFTOOL_METADATA: ProcessorDef = ProcessorDef::new(
    "gps.by_exiftool_metadata",
    &[field::METADATA],
    gps_by_exiftool_metadata,
);

static DMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\d+)\s*(?:deg|°)\s*(\d+)\s*'\s*(\d+(?:\.\d+)?)\s*"\s*([NSEW])?$"#).unwrap()
});

static ALTITUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(-?\d+(?:\.\d+)?)\s*m\s*(?:(Above|Below) Sea Level)?$").unwrap()
});

static LATITUDE_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)GPSLatitude$").unwrap());
static LONGITUDE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)GPSLongitude$").unwrap());
static ALTITUDE_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)GPSAltitude$").unwrap());

/// Converts `51 deg 50' 20.13" N` to decimal degrees; south and west are
/// negative. Returns `None` for anything else.
pub fn dms_to_decimal(text: &str) -> Option<f64> {
    let caps = DMS.captures(text.trim())?;
    let degrees: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;

    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match caps.get(4).map(|m| m.as_str()) {
        Some("S") | Some("W") => Some(-value),
        _ => Some(value),
    }
}

/// Parses `123.4 m Above Sea Level`. Below sea level is negative.
pub fn altitude_m(text: &str) -> Option<f64> {
    let caps = ALTITUDE.captures(text.trim())?;
    let value: f64 = caps[1].parse().ok()?;
    let below = caps
        .get(2)
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case("below"));
    Some(if below { -value.abs() } else { value })
}

fn gps_by_exiftool_metadata(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    let exif = cached_probe(input, "exiftool")?;
    if exif.is_null() {
        return Ok(Output::Skip);
    }

    let text = |key: &Regex| metadata::first_filled_matching(&exif, key).and_then(metadata::as_text);
    let latitude = text(&*LATITUDE_KEY).as_deref().and_then(dms_to_decimal);
    let longitude = text(&*LONGITUDE_KEY).as_deref().and_then(dms_to_decimal);
    let altitude = text(&*ALTITUDE_KEY).as_deref().and_then(altitude_m);

    Ok(Output::pairs([
        (field::GPS_LATITUDE, Value::from(latitude)),
        (field::GPS_LONGITUDE, Value::from(longitude)),
        (field::GPS_ALTITUDE_M, Value::from(altitude)),
    ]))
}
