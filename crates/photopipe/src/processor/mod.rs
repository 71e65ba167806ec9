//! Built-in processor library and the stage pipelines assembled from it.
//!
//! Processors are plain functions registered under dotted identifiers
//! (`image.shot_at_by_exiftool_metadata`). Each one declares the record
//! fields it reads; those names double as the columns the loader fetches,
//! so every declared parameter must be a record field or an injected key.

pub mod categories;
pub mod common;
pub mod content_path;
pub mod gps;
pub mod groups;
pub mod image_metadata;
pub mod notify;
pub mod record;
pub mod screenshot;
pub mod thumbnail;
pub mod video_metadata;

use serde_json::Value as Json;

use crate::error::ProcessError;
use crate::media::{field, MediaType};
use crate::pipeline::{Input, ProcessorDef};

/// Processor identifiers per stage, in execution order.
pub mod pipelines {
    pub const BASE_METADATA: &[&str] = &[
        "record.load",
        "common.mimetype_by_content",
        "common.media_type_by_mimetype",
        "common.exiftool_metadata_by_content",
        "common.mimetype_by_exiftool_metadata",
        "image.degree_by_exiftool_metadata",
        "image.size_camera_by_exiftool_metadata",
        "image.shot_at_by_exiftool_metadata",
        "video.ffprobe_metadata_by_content",
        "video.duration_size_by_ffprobe_metadata",
        "video.degree_by_ffprobe_metadata",
        "video.camera_by_ffprobe_metadata",
        "video.shot_at_by_ffprobe_metadata",
        "common.show_at_by_shot_at_source_lastmodified",
        // must stay right before record.save
        "content.path_by_extension_show_at",
        "record.save",
    ];

    pub const QUICK_THUMBNAIL: &[&str] = &[
        "record.load",
        "thumbnail.by_content_degree",
        "thumbnail.by_embedded_preview",
        "video.screenshot_by_duration_content",
        "thumbnail.by_screenshot_degree",
        "record.save",
        "notify.thumbnail_ready",
    ];

    pub const PLAY_MEDIA: &[&str] = &["record.load", "record.save"];

    pub const METADATA: &[&str] = &["record.load", "gps.by_exiftool_metadata", "record.save"];

    pub const CATEGORIES: &[&str] = &[
        "record.load",
        "categories.empty",
        "categories.type_by_media_type",
        "categories.aspect_ratio_by_thumbnail_size",
        "categories.panorama_by_thumbnail_size",
        "categories.widescreen_by_thumbnail_size",
        "record.save",
    ];

    pub const GROUPS: &[&str] = &["record.load", "groups.by_shot_at", "record.save"];
}

pub fn standard_processors() -> Vec<ProcessorDef> {
    vec![
        record::LOAD,
        record::SAVE,
        common::MIMETYPE_BY_CONTENT,
        common::MEDIA_TYPE_BY_MIMETYPE,
        common::EXIFTOOL_METADATA_BY_CONTENT,
        common::MIMETYPE_BY_EXIFTOOL_METADATA,
        common::SHOW_AT_BY_SHOT_AT_SOURCE_LASTMODIFIED,
        image_metadata::DEGREE_BY_EXIFTOOL_METADATA,
        image_metadata::SIZE_CAMERA_BY_EXIFTOOL_METADATA,
        image_metadata::SHOT_AT_BY_EXIFTOOL_METADATA,
        video_metadata::FFPROBE_METADATA_BY_CONTENT,
        video_metadata::DURATION_SIZE_BY_FFPROBE_METADATA,
        video_metadata::DEGREE_BY_FFPROBE_METADATA,
        video_metadata::CAMERA_BY_FFPROBE_METADATA,
        video_metadata::SHOT_AT_BY_FFPROBE_METADATA,
        content_path::PATH_BY_EXTENSION_SHOW_AT,
        thumbnail::BY_CONTENT_DEGREE,
        thumbnail::BY_EMBEDDED_PREVIEW,
        thumbnail::BY_SCREENSHOT_DEGREE,
        screenshot::SCREENSHOT_BY_DURATION_CONTENT,
        gps::GPS_BY_EXIFTOOL_METADATA,
        categories::EMPTY,
        categories::TYPE_BY_MEDIA_TYPE,
        categories::ASPECT_RATIO_BY_THUMBNAIL_SIZE,
        categories::PANORAMA_BY_THUMBNAIL_SIZE,
        categories::WIDESCREEN_BY_THUMBNAIL_SIZE,
        groups::BY_SHOT_AT,
        notify::THUMBNAIL_READY,
    ]
}

fn media_type(input: &Input<'_>) -> Result<Option<MediaType>, ProcessError> {
    input.media_type(field::MEDIA_TYPE)
}

fn is_image(input: &Input<'_>) -> Result<bool, ProcessError> {
    Ok(media_type(input)? == Some(MediaType::Image))
}

fn is_video(input: &Input<'_>) -> Result<bool, ProcessError> {
    Ok(media_type(input)? == Some(MediaType::Video))
}

fn is_visual(input: &Input<'_>) -> Result<bool, ProcessError> {
    Ok(media_type(input)?.is_some_and(MediaType::is_visual))
}

/// Probe output cached under `metadata.<tool>`, `Null` when absent.
fn cached_probe(input: &Input<'_>, tool: &str) -> Result<Json, ProcessError> {
    Ok(input
        .json_object(field::METADATA)?
        .get(tool)
        .cloned()
        .unwrap_or(Json::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ProcessorRegistry;

    #[test]
    fn test_identifiers_are_unique() {
        let registry = ProcessorRegistry::new(standard_processors());
        assert!(registry.is_ok());
    }

    #[test]
    fn test_every_pipeline_loads_first_and_saves() {
        for names in [
            pipelines::BASE_METADATA,
            pipelines::QUICK_THUMBNAIL,
            pipelines::PLAY_MEDIA,
            pipelines::METADATA,
            pipelines::CATEGORIES,
            pipelines::GROUPS,
        ] {
            assert_eq!(names[0], "record.load");
            assert!(names.contains(&"record.save"));
        }
    }

    #[test]
    fn test_content_path_runs_right_before_save() {
        let names = pipelines::BASE_METADATA;
        let at = names
            .iter()
            .position(|n| *n == "content.path_by_extension_show_at")
            .unwrap();
        assert_eq!(names[at + 1], "record.save");
    }

    #[test]
    fn test_declared_params_are_loadable() {
        use crate::media::injected;
        use crate::testing::test_context;
        use std::collections::BTreeSet;

        let (_dir, ctx) = test_context();
        let id = ctx
            .records
            .create(&crate::testing::fixtures::new_media(1))
            .unwrap();
        for def in standard_processors() {
            let names: BTreeSet<String> = def
                .params
                .iter()
                .filter(|p| !injected::contains(p))
                .map(|p| p.to_string())
                .collect();
            assert!(
                ctx.records.fetch(id, &names).is_ok(),
                "{} declares a parameter the store cannot load",
                def.name
            );
        }
    }
}
