//! Builders for uploads and the probe output that goes with them.

#![allow(dead_code)]

use serde_json::{json, Value as Json};

use photopipe::testing::{fixtures, MockTools};

/// A camera JPEG together with what exiftool would report for it.
pub struct CameraShotBuilder {
    width: u32,
    height: u32,
    orientation: String,
    shot_at: Option<String>,
    gps: Option<(String, String, String)>,
}

impl CameraShotBuilder {
    pub fn new() -> Self {
        Self {
            width: 320,
            height: 240,
            orientation: "Horizontal (normal)".to_string(),
            shot_at: None,
            gps: None,
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn orientation(mut self, orientation: &str) -> Self {
        self.orientation = orientation.to_string();
        self
    }

    pub fn shot_at(mut self, shot_at: &str) -> Self {
        self.shot_at = Some(shot_at.to_string());
        self
    }

    pub fn gps(mut self, latitude: &str, longitude: &str, altitude: &str) -> Self {
        self.gps = Some((
            latitude.to_string(),
            longitude.to_string(),
            altitude.to_string(),
        ));
        self
    }

    pub fn exif(&self) -> Json {
        let mut exif = fixtures::camera_exif(
            self.width,
            self.height,
            &self.orientation,
            self.shot_at.as_deref().unwrap_or(""),
        );
        if let (Some((lat, lon, alt)), Some(map)) = (&self.gps, exif.as_object_mut()) {
            map.insert("Composite:GPSLatitude".to_string(), json!(lat));
            map.insert("Composite:GPSLongitude".to_string(), json!(lon));
            map.insert("EXIF:GPSAltitude".to_string(), json!(alt));
        }
        exif
    }

    /// JPEG bytes plus tools that report this shot's exif.
    pub fn build(&self) -> (Vec<u8>, MockTools) {
        let bytes = fixtures::jpeg_bytes(self.width, self.height);
        let tools = MockTools::default().with_exiftool(self.exif());
        (bytes, tools)
    }
}

impl Default for CameraShotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
