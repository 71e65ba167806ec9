//! Thumbnail generation from the content, an embedded preview or a video
//! screenshot, whichever is available first.

use std::io::Cursor;
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::ProcessError;
use crate::media::{field, injected, RecordId, Value};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessingSettings, ProcessorDef};
use crate::tools::metadata;

use super::{cached_probe, is_image, is_video};

pub const BY_CONTENT_DEGREE: ProcessorDef = ProcessorDef::new(
    "thumbnail.by_content_degree",
    &[
        injected::RECORD_ID,
        field::UPLOADER_ID,
        field::MEDIA_TYPE,
        field::CONTENT,
        field::NEEDED_ROTATE_DEGREE,
    ],
    by_content_degree,
);

pub const BY_EMBEDDED_PREVIEW: ProcessorDef = ProcessorDef::new(
    "thumbnail.by_embedded_preview",
    &[
        injected::RECORD_ID,
        field::UPLOADER_ID,
        field::MEDIA_TYPE,
        field::CONTENT,
        field::NEEDED_ROTATE_DEGREE,
        field::THUMBNAIL,
        field::METADATA,
    ],
    by_embedded_preview,
);

pub const BY_SCREENSHOT_DEGREE: ProcessorDef = ProcessorDef::new(
    "thumbnail.by_screenshot_degree",
    &[
        injected::RECORD_ID,
        field::UPLOADER_ID,
        field::MEDIA_TYPE,
        field::SCREENSHOT,
        field::NEEDED_ROTATE_DEGREE,
    ],
    by_screenshot_degree,
);

pub(super) fn decode(bytes: &[u8]) -> Result<DynamicImage, ProcessError> {
    image::load_from_memory(bytes).map_err(|e| ProcessError::ImageProcessing(e.to_string()))
}

/// Baseline (non-progressive) JPEG; the `image` encoder has no progressive mode.
pub(super) fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ProcessError> {
    let rgb = img.to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| ProcessError::ImageProcessing(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Shrinks into the configured square box keeping the aspect ratio,
/// rotates clockwise by `degree`, and encodes as JPEG.
///
/// Images already inside the box keep their size.
pub fn make_thumbnail(
    img: DynamicImage,
    degree: i64,
    settings: &ProcessingSettings,
) -> Result<(Vec<u8>, u32, u32), ProcessError> {
    if degree.rem_euclid(90) != 0 {
        return Err(ProcessError::UnsupportedRotation(degree));
    }

    let size = settings.thumbnail_size;
    let resized = if img.width() > size || img.height() > size {
        img.resize(size, size, FilterType::Lanczos3)
    } else {
        img
    };

    let rotated = match degree.rem_euclid(360) {
        90 => resized.rotate90(),
        180 => resized.rotate180(),
        270 => resized.rotate270(),
        _ => resized,
    };

    let bytes = encode_jpeg(&rotated, settings.thumbnail_quality)?;
    Ok((bytes, rotated.width(), rotated.height()))
}

fn thumbnail_path(uploader_id: i64, record_id: RecordId) -> PathBuf {
    PathBuf::from("thumbnail")
        .join(uploader_id.to_string())
        .join(format!("{record_id}.jpg"))
}

/// Builds the thumbnail for `img` and stores it under the record's path.
fn store_thumbnail(
    ctx: &ProcessingContext,
    input: &Input<'_>,
    img: DynamicImage,
) -> Result<Output, ProcessError> {
    let record_id = input.record_id()?;
    let uploader_id = input.required_i64(field::UPLOADER_ID)?;
    let degree = input.optional_i64(field::NEEDED_ROTATE_DEGREE)?.unwrap_or(0);

    let (bytes, width, height) = make_thumbnail(img, degree, &ctx.settings)?;
    let path = ctx
        .content
        .write(&thumbnail_path(uploader_id, record_id), &bytes)?;
    debug!(record_id, width, height, "stored thumbnail");

    Ok(Output::pairs([
        (field::THUMBNAIL, Value::from(path)),
        (field::THUMBNAIL_WIDTH, Value::from(width)),
        (field::THUMBNAIL_HEIGHT, Value::from(height)),
    ]))
}

/// Decodes the content itself. Formats the decoder does not know (raw
/// camera files, HEIC) leave `thumbnail` empty for the embedded preview.
fn by_content_degree(ctx: &ProcessingContext, input: &Input<'_>) -> Result<Output, ProcessError> {
    if !is_image(input)? {
        return Ok(Output::Skip);
    }

    let bytes = ctx.content.read(input.required_path(field::CONTENT)?)?;
    match decode(&bytes) {
        Ok(img) => store_thumbnail(ctx, input, img),
        Err(e) => {
            warn!(record_id = input.record_id()?, error = %e, "content is not decodable");
            Ok(Output::pair(field::THUMBNAIL, Value::Null))
        }
    }
}

fn by_embedded_preview(
    ctx: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_image(input)? || input.optional_path(field::THUMBNAIL)?.is_some() {
        return Ok(Output::Skip);
    }

    let path = ctx.content.absolute(input.required_path(field::CONTENT)?)?;
    let exif = cached_probe(input, "exiftool")?;

    for (tag, size) in metadata::embedded_resources(&exif) {
        let bytes = match ctx.tools.extract_embedded(&path, &tag) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(tag, error = %e, "embedded resource not extractable");
                continue;
            }
        };
        match decode(&bytes) {
            Ok(img) => {
                debug!(tag, size, "using embedded preview");
                return store_thumbnail(ctx, input, img);
            }
            Err(e) => debug!(tag, error = %e, "embedded resource is not an image"),
        }
    }

    Err(ProcessError::NoEmbeddedImage)
}

fn by_screenshot_degree(
    ctx: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if !is_video(input)? {
        return Ok(Output::Skip);
    }
    let Some(screenshot) = input.optional_path(field::SCREENSHOT)? else {
        return Ok(Output::Skip);
    };

    let img = decode(&ctx.content.read(screenshot)?)?;
    store_thumbnail(ctx, input, img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Fields, MediaType};
    use crate::testing::{fixtures, test_context, test_context_with_tools, MockTools};
    use image::GenericImageView;
    use serde_json::json;
    use std::path::Path;

    fn image_fields(id: RecordId, content: &str, degree: i64) -> Fields {
        Fields::from([
            (injected::RECORD_ID.to_string(), Value::Int(id)),
            (field::UPLOADER_ID.to_string(), Value::Int(4)),
            (field::MEDIA_TYPE.to_string(), Value::from(MediaType::Image)),
            (field::CONTENT.to_string(), Value::File(content.into())),
            (field::NEEDED_ROTATE_DEGREE.to_string(), Value::Int(degree)),
        ])
    }

    #[test]
    fn test_make_thumbnail_rotates_and_fits_box() {
        let img = decode(&fixtures::jpeg_bytes(640, 320)).unwrap();
        let settings = ProcessingSettings::default();

        let (bytes, w, h) = make_thumbnail(img, 90, &settings).unwrap();
        assert_eq!((w, h), (80, 160));
        assert_eq!(decode(&bytes).unwrap().dimensions(), (80, 160));
    }

    #[test]
    fn test_small_images_are_not_enlarged() {
        let img = decode(&fixtures::jpeg_bytes(40, 20)).unwrap();
        let (_, w, h) = make_thumbnail(img, 0, &ProcessingSettings::default()).unwrap();
        assert_eq!((w, h), (40, 20));
    }

    #[test]
    fn test_odd_rotation_rejected() {
        let img = decode(&fixtures::jpeg_bytes(10, 10)).unwrap();
        let err = make_thumbnail(img, 45, &ProcessingSettings::default()).unwrap_err();
        assert!(matches!(err, ProcessError::UnsupportedRotation(45)));
    }

    #[test]
    fn test_by_content_writes_thumbnail() {
        let (_dir, ctx) = test_context();
        ctx.content
            .write(Path::new("content/4/a"), &fixtures::jpeg_bytes(320, 240))
            .unwrap();

        let input = image_fields(9, "content/4/a", 0);
        let output = by_content_degree(&ctx, &Input::from_fields(&input))
            .unwrap()
            .into_fields();

        assert_eq!(output[field::THUMBNAIL], Value::File("thumbnail/4/9.jpg".into()));
        assert_eq!(output[field::THUMBNAIL_WIDTH], Value::Int(160));
        assert_eq!(output[field::THUMBNAIL_HEIGHT], Value::Int(120));
        assert!(ctx.content.exists(Path::new("thumbnail/4/9.jpg")));
    }

    #[test]
    fn test_undecodable_content_leaves_thumbnail_empty() {
        let (_dir, ctx) = test_context();
        ctx.content
            .write(Path::new("content/4/raw"), b"not really a raw file")
            .unwrap();

        let input = image_fields(9, "content/4/raw", 0);
        let output = by_content_degree(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(output, Output::pair(field::THUMBNAIL, Value::Null));
    }

    #[test]
    fn test_embedded_preview_tries_biggest_decodable() {
        let tools = MockTools::default()
            .with_embedded("PreviewImage", b"garbage".to_vec())
            .with_embedded("ThumbnailImage", fixtures::jpeg_bytes(120, 80));
        let (_dir, ctx) = test_context_with_tools(tools);

        let mut input = image_fields(9, "content/4/raw", 0);
        input.insert(
            field::METADATA.to_string(),
            Value::Json(json!({"exiftool": {
                "EXIF:ThumbnailImage": "(Binary data 5000 bytes, use -b option to extract)",
                "Composite:PreviewImage": "(Binary data 90000 bytes, use -b option to extract)"
            }})),
        );
        input.insert(field::THUMBNAIL.to_string(), Value::Null);

        let output = by_embedded_preview(&ctx, &Input::from_fields(&input))
            .unwrap()
            .into_fields();
        assert_eq!(output[field::THUMBNAIL_WIDTH], Value::Int(120));
        assert_eq!(output[field::THUMBNAIL_HEIGHT], Value::Int(80));
    }

    #[test]
    fn test_embedded_preview_missing_fails() {
        let (_dir, ctx) = test_context();
        let mut input = image_fields(9, "content/4/raw", 0);
        input.insert(field::METADATA.to_string(), Value::Json(json!({"exiftool": {}})));

        let err = by_embedded_preview(&ctx, &Input::from_fields(&input)).unwrap_err();
        assert!(matches!(err, ProcessError::NoEmbeddedImage));
    }

    #[test]
    fn test_embedded_preview_skipped_when_thumbnail_exists() {
        let (_dir, ctx) = test_context();
        let mut input = image_fields(9, "content/4/a", 0);
        input.insert(
            field::THUMBNAIL.to_string(),
            Value::File("thumbnail/4/9.jpg".into()),
        );
        let output = by_embedded_preview(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(output, Output::Skip);
    }
}
