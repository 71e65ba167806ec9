use serde::{Deserialize, Serialize};

/// Broad kind of an uploaded file, derived from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Image,
    Video,
    Other,
}

impl MediaType {
    pub fn code(self) -> i64 {
        match self {
            MediaType::Image => 1,
            MediaType::Video => 2,
            MediaType::Other => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(MediaType::Image),
            2 => Some(MediaType::Video),
            3 => Some(MediaType::Other),
            _ => None,
        }
    }

    /// Classifies by the top-level part of a MIME type (`image/jpeg` -> image).
    pub fn from_mimetype(mimetype: &str) -> Self {
        match mimetype.split('/').next().unwrap_or_default() {
            "image" => MediaType::Image,
            "video" => MediaType::Video,
            _ => MediaType::Other,
        }
    }

    pub fn is_visual(self) -> bool {
        matches!(self, MediaType::Image | MediaType::Video)
    }
}

/// Classification tags. Codes are stable and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Image,
    Selfie,
    Panorama,
    Screenshot,
    Video,
    VideoInterval,
    VideoSlomo,
    VideoWidescreen,
    Burst,
    MediaPortrait,
    MediaLandscape,
    MediaSquare,
    NonMedia,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Image,
        Category::Selfie,
        Category::Panorama,
        Category::Screenshot,
        Category::Video,
        Category::VideoInterval,
        Category::VideoSlomo,
        Category::VideoWidescreen,
        Category::Burst,
        Category::MediaPortrait,
        Category::MediaLandscape,
        Category::MediaSquare,
        Category::NonMedia,
    ];

    pub fn code(self) -> i64 {
        match self {
            Category::Image => 1,
            Category::Selfie => 2,
            Category::Panorama => 3,
            Category::Screenshot => 4,
            Category::Video => 10,
            Category::VideoInterval => 11,
            Category::VideoSlomo => 12,
            Category::VideoWidescreen => 13,
            Category::Burst => 20,
            Category::MediaPortrait => 21,
            Category::MediaLandscape => 22,
            Category::MediaSquare => 23,
            Category::NonMedia => 30,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_mimetype() {
        assert_eq!(MediaType::from_mimetype("image/jpeg"), MediaType::Image);
        assert_eq!(MediaType::from_mimetype("video/quicktime"), MediaType::Video);
        assert_eq!(MediaType::from_mimetype("application/pdf"), MediaType::Other);
        assert_eq!(MediaType::from_mimetype(""), MediaType::Other);
    }

    #[test]
    fn test_category_codes_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_code(category.code()), Some(category));
        }
        assert_eq!(Category::from_code(99), None);
    }

    #[test]
    fn test_category_codes_are_stable() {
        assert_eq!(Category::Panorama.code(), 3);
        assert_eq!(Category::VideoWidescreen.code(), 13);
        assert_eq!(Category::NonMedia.code(), 30);
    }
}
