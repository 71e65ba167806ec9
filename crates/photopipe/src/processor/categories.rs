//! Category tags derived from media type and thumbnail geometry.
//!
//! The stage starts from an empty set so re-running it never keeps stale
//! tags; each later processor adds at most one tag.

use std::collections::BTreeSet;

use crate::error::ProcessError;
use crate::media::{field, Category, MediaType};
use crate::pipeline::{Input, Output, ProcessingContext, ProcessorDef};

use super::media_type;

pub const EMPTY: ProcessorDef = ProcessorDef::new("categories.empty", &[], empty);

pub const TYPE_BY_MEDIA_TYPE: ProcessorDef = ProcessorDef::new(
    "categories.type_by_media_type",
    &[field::CATEGORIES, field::MEDIA_TYPE],
    type_by_media_type,
);

pub const ASPECT_RATIO_BY_THUMBNAIL_SIZE: ProcessorDef = ProcessorDef::new(
    "categories.aspect_ratio_by_thumbnail_size",
    &[field::CATEGORIES, field::THUMBNAIL_WIDTH, field::THUMBNAIL_HEIGHT],
    aspect_ratio_by_thumbnail_size,
);

pub const PANORAMA_BY_THUMBNAIL_SIZE: ProcessorDef = ProcessorDef::new(
    "categories.panorama_by_thumbnail_size",
    &[
        field::CATEGORIES,
        field::MEDIA_TYPE,
        field::THUMBNAIL_WIDTH,
        field::THUMBNAIL_HEIGHT,
    ],
    panorama_by_thumbnail_size,
);

pub const WIDESCREEN_BY_THUMBNAIL_SIZE: ProcessorDef = ProcessorDef::new(
    "categories.widescreen_by_thumbnail_size",
    &[
        field::CATEGORIES,
        field::MEDIA_TYPE,
        field::THUMBNAIL_WIDTH,
        field::THUMBNAIL_HEIGHT,
    ],
    widescreen_by_thumbnail_size,
);

/// Long edge over short edge at which a picture counts as panoramic.
const WIDE_ASPECT: f64 = 2.0;

fn empty(_: &ProcessingContext, _: &Input<'_>) -> Result<Output, ProcessError> {
    Ok(Output::pair(field::CATEGORIES, BTreeSet::<Category>::new()))
}

fn with_category(input: &Input<'_>, category: Category) -> Result<Output, ProcessError> {
    let mut categories = input.categories(field::CATEGORIES)?;
    categories.insert(category);
    Ok(Output::pair(field::CATEGORIES, categories))
}

fn thumbnail_size(input: &Input<'_>) -> Result<Option<(i64, i64)>, ProcessError> {
    let width = input.optional_i64(field::THUMBNAIL_WIDTH)?;
    let height = input.optional_i64(field::THUMBNAIL_HEIGHT)?;
    Ok(width.zip(height).filter(|(w, h)| *w > 0 && *h > 0))
}

fn is_wide(input: &Input<'_>) -> Result<bool, ProcessError> {
    Ok(thumbnail_size(input)?.is_some_and(|(w, h)| {
        let (long, short) = (w.max(h) as f64, w.min(h) as f64);
        long / short >= WIDE_ASPECT
    }))
}

fn type_by_media_type(_: &ProcessingContext, input: &Input<'_>) -> Result<Output, ProcessError> {
    let category = match media_type(input)? {
        Some(MediaType::Image) => Category::Image,
        Some(MediaType::Video) => Category::Video,
        Some(MediaType::Other) | None => Category::NonMedia,
    };
    with_category(input, category)
}

fn aspect_ratio_by_thumbnail_size(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    let category = match thumbnail_size(input)? {
        None => Category::NonMedia,
        Some((w, h)) if w == h => Category::MediaSquare,
        Some((w, h)) if w > h => Category::MediaLandscape,
        Some(_) => Category::MediaPortrait,
    };
    with_category(input, category)
}

fn panorama_by_thumbnail_size(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if media_type(input)? == Some(MediaType::Image) && is_wide(input)? {
        return with_category(input, Category::Panorama);
    }
    Ok(Output::Skip)
}

fn widescreen_by_thumbnail_size(
    _: &ProcessingContext,
    input: &Input<'_>,
) -> Result<Output, ProcessError> {
    if media_type(input)? == Some(MediaType::Video) && is_wide(input)? {
        return with_category(input, Category::VideoWidescreen);
    }
    Ok(Output::Skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Fields, Value};
    use crate::testing::test_context;

    fn fields(media_type: MediaType, size: Option<(i64, i64)>) -> Fields {
        let (w, h) = size.unzip();
        Fields::from([
            (field::CATEGORIES.to_string(), Value::from(BTreeSet::<Category>::new())),
            (field::MEDIA_TYPE.to_string(), Value::from(media_type)),
            (field::THUMBNAIL_WIDTH.to_string(), Value::from(w)),
            (field::THUMBNAIL_HEIGHT.to_string(), Value::from(h)),
        ])
    }

    fn categories(output: Output) -> BTreeSet<Category> {
        output.into_fields()[field::CATEGORIES]
            .as_categories()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_empty_resets() {
        let (_dir, ctx) = test_context();
        let stale = Fields::from([(
            field::CATEGORIES.to_string(),
            Value::from(BTreeSet::from([Category::Burst])),
        )]);
        let output = empty(&ctx, &Input::from_fields(&stale)).unwrap();
        assert!(categories(output).is_empty());
    }

    #[test]
    fn test_type_by_media_type() {
        let (_dir, ctx) = test_context();
        for (media_type, expected) in [
            (MediaType::Image, Category::Image),
            (MediaType::Video, Category::Video),
            (MediaType::Other, Category::NonMedia),
        ] {
            let input = fields(media_type, None);
            let output = type_by_media_type(&ctx, &Input::from_fields(&input)).unwrap();
            assert_eq!(categories(output), BTreeSet::from([expected]));
        }
    }

    #[test]
    fn test_aspect_ratio() {
        let (_dir, ctx) = test_context();
        for (size, expected) in [
            (Some((160, 160)), Category::MediaSquare),
            (Some((160, 120)), Category::MediaLandscape),
            (Some((90, 160)), Category::MediaPortrait),
            (None, Category::NonMedia),
        ] {
            let input = fields(MediaType::Image, size);
            let output = aspect_ratio_by_thumbnail_size(&ctx, &Input::from_fields(&input)).unwrap();
            assert_eq!(categories(output), BTreeSet::from([expected]));
        }
    }

    #[test]
    fn test_panorama_only_for_wide_images() {
        let (_dir, ctx) = test_context();

        let input = fields(MediaType::Image, Some((160, 40)));
        let output = panorama_by_thumbnail_size(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(categories(output), BTreeSet::from([Category::Panorama]));

        // tall panoramas count too
        let input = fields(MediaType::Image, Some((60, 160)));
        let output = panorama_by_thumbnail_size(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(categories(output), BTreeSet::from([Category::Panorama]));

        let input = fields(MediaType::Image, Some((160, 90)));
        let output = panorama_by_thumbnail_size(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(output, Output::Skip);

        let input = fields(MediaType::Video, Some((160, 40)));
        let output = panorama_by_thumbnail_size(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(output, Output::Skip);
    }

    #[test]
    fn test_widescreen_only_for_videos() {
        let (_dir, ctx) = test_context();
        let input = fields(MediaType::Video, Some((160, 68)));
        let output = widescreen_by_thumbnail_size(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(categories(output), BTreeSet::from([Category::VideoWidescreen]));

        let input = fields(MediaType::Image, Some((160, 68)));
        let output = widescreen_by_thumbnail_size(&ctx, &Input::from_fields(&input)).unwrap();
        assert_eq!(output, Output::Skip);
    }
}
