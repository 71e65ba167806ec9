//! Canned records, images and probe output.

use std::io::Cursor;
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use serde_json::{json, Value as Json};
use uuid::Uuid;

use crate::storage::NewMedia;

/// A random but well-formed SHA-1 hex digest.
pub fn random_sha1() -> String {
    format!("{:040x}", Uuid::new_v4().as_u128())
}

/// A freshly uploaded JPEG owned by `uploader_id`, unique per call.
pub fn new_media(uploader_id: i64) -> NewMedia {
    let sha1_hex = random_sha1();
    NewMedia {
        uploader_id,
        session_id: Uuid::new_v4(),
        content: PathBuf::from(format!("content/{uploader_id}/{sha1_hex}_3")),
        size_bytes: 3,
        sha1_hex,
        mimetype: "image/jpeg".to_string(),
        source_filename: "IMG_0001.JPG".to_string(),
        source_lastmodified: None,
    }
}

/// A `width` x `height` gradient encoded as JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(&img)
        .expect("Failed to encode fixture JPEG");
    buf.into_inner()
}

/// exiftool output of a camera JPEG, in `-groupNames -json` layout.
pub fn camera_exif(width: u32, height: u32, orientation: &str, shot_at: &str) -> Json {
    json!({
        "File:MIMEType": "image/jpeg",
        "File:ImageWidth": width,
        "File:ImageHeight": height,
        "EXIF:Orientation": orientation,
        "EXIF:Model": "Canon EOS 5D Mark III",
        "EXIF:DateTimeOriginal": shot_at
    })
}

/// ffprobe output with one video and one audio stream.
pub fn ffprobe_json(width: u32, height: u32, duration_secs: f64, format_tags: Option<Json>) -> Json {
    json!({
        "streams": [
            {
                "codec_type": "video",
                "width": width,
                "height": height,
                "duration": format!("{duration_secs:.6}")
            },
            {"codec_type": "audio", "duration": format!("{duration_secs:.6}")}
        ],
        "format": {
            "duration": format!("{duration_secs:.6}"),
            "tags": format_tags.unwrap_or_else(|| json!({}))
        }
    })
}
