//! Final storage location of the uploaded content.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ProcessError;
use crate::media::field;
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};
use crate::sanitize;

pub const PATH_BY_EXTENSION_SHOW_AT: ProcessorDef = ProcessorDef::new(
    "content.path_by_extension_show_at",
    &[
        field::CONTENT,
        field::UPLOADER_ID,
        field::SHOW_AT,
        field::SHA1_HEX,
        field::MIMETYPE,
        field::SOURCE_FILENAME,
    ],
    path_by_extension_show_at,
);

/// Extensions `mime_guess` would otherwise pick oddly (`.jpe`, `.qt`).
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/heic", ".heic"),
    ("image/tiff", ".tiff"),
    ("image/x-canon-cr2", ".cr2"),
    ("image/x-nikon-nef", ".nef"),
    ("video/quicktime", ".mov"),
    ("video/mp4", ".mp4"),
];

/// File extension (with the dot) for a MIME type, falling back to the
/// lowercased extension of the uploaded filename. Empty when neither helps.
pub fn resolve_extension(mimetype: Option<&str>, source_filename: Option<&str>) -> String {
    let by_mimetype = mimetype.and_then(|mime| {
        PREFERRED_EXTENSIONS
            .iter()
            .find(|(m, _)| *m == mime)
            .map(|(_, ext)| ext.to_string())
            .or_else(|| {
                mime_guess::get_mime_extensions_str(mime)
                    .and_then(|exts| exts.first())
                    .map(|ext| format!(".{ext}"))
            })
    });

    by_mimetype
        .or_else(|| {
            source_filename
                .map(Path::new)
                .and_then(Path::extension)
                .and_then(|ext| ext.to_str())
                .filter(|ext| !ext.is_empty())
                .map(|ext| format!(".{}", ext.to_lowercase()))
        })
        .unwrap_or_default()
}

/// Moves the content to
/// `content/{uploader}/{YYYY-MM}/{DD-HHMMSS}_{sha1}{ext}` once `show_at`
/// is known, so files sort by the time they are shown at.
fn path_by_extension_show_at(
    ctx: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    let Some(show_at) = input.optional_timestamp(field::SHOW_AT)? else {
        return Ok(Output::Skip);
    };
    let current = input.required_path(field::CONTENT)?;
    let uploader_id = input.required_i64(field::UPLOADER_ID)?;
    let sha1_hex = input
        .optional_str(field::SHA1_HEX)?
        .ok_or(ProcessError::InvalidInput {
            field: field::SHA1_HEX,
            expected: "text",
        })?;

    let extension = resolve_extension(
        input.optional_str(field::MIMETYPE)?,
        input.optional_str(field::SOURCE_FILENAME)?,
    );
    let target = PathBuf::from("content")
        .join(uploader_id.to_string())
        .join(show_at.format("%Y-%m").to_string())
        .join(format!(
            "{}_{}{}",
            show_at.format("%d-%H%M%S"),
            sha1_hex,
            extension
        ));

    if target == current {
        return Ok(Output::Skip);
    }

    let moved = ctx.content.relocate(current, &target)?;
    info!(
        from = %sanitize::redact_path(current),
        to = %sanitize::redact_path(&moved),
        sha1 = sanitize::short_digest(sha1_hex),
        "relocated content"
    );
    Ok(Output::pair(field::CONTENT, moved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Fields, Value};
    use crate::testing::test_context;
    use chrono::DateTime;

    const SHA1: &str = "0123456789abcdef0123456789abcdef01234567";

    fn fields(content: &str, show_at: Option<&str>) -> Fields {
        Fields::from([
            (field::CONTENT.to_string(), Value::File(content.into())),
            (field::UPLOADER_ID.to_string(), Value::Int(3)),
            (
                field::SHOW_AT.to_string(),
                Value::from(show_at.map(|s| DateTime::parse_from_rfc3339(s).unwrap())),
            ),
            (field::SHA1_HEX.to_string(), Value::from(SHA1)),
            (field::MIMETYPE.to_string(), Value::from("image/jpeg")),
            (field::SOURCE_FILENAME.to_string(), Value::from("IMG_0001.JPG")),
        ])
    }

    #[test]
    fn test_resolve_extension() {
        assert_eq!(resolve_extension(Some("image/jpeg"), None), ".jpg");
        assert_eq!(resolve_extension(Some("video/quicktime"), Some("a.MOV")), ".mov");
        assert_eq!(resolve_extension(Some("image/gif"), None), ".gif");
        assert_eq!(
            resolve_extension(Some("application/x-unknown-thing"), Some("scan.DNG")),
            ".dng"
        );
        assert_eq!(resolve_extension(None, Some("noext")), "");
        assert_eq!(resolve_extension(None, None), "");
    }

    #[test]
    fn test_moves_content_under_show_at() {
        let (_dir, ctx) = test_context();
        let staged = format!("content/3/{SHA1}_12");
        ctx.content.write(Path::new(&staged), b"bytes").unwrap();

        let input = fields(&staged, Some("2016-10-22T14:39:13+02:00"));
        let output = path_by_extension_show_at(&ctx, &Input::from_fields(&input)).unwrap();

        let expected = PathBuf::from(format!("content/3/2016-10/22-143913_{SHA1}.jpg"));
        assert_eq!(output, Output::pair(field::CONTENT, expected.clone()));
        assert!(ctx.content.exists(&expected));
        assert!(!ctx.content.exists(Path::new(&staged)));
    }

    #[test]
    fn test_skips_without_show_at() {
        let (_dir, ctx) = test_context();
        let input = fields("content/3/x", None);
        let output = path_by_extension_show_at(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(output, Output::Skip);
    }

    #[test]
    fn test_skips_when_already_in_place() {
        let (_dir, ctx) = test_context();
        let placed = format!("content/3/2016-10/22-143913_{SHA1}.jpg");
        let input = fields(&placed, Some("2016-10-22T14:39:13+02:00"));
        let output = path_by_extension_show_at(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(output, Output::Skip);
    }
}
