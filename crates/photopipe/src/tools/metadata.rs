//! Lookups over probe JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as Json;

static BINARY_RESOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[(]Binary data (\d+) bytes, use -b option to extract[)]$").unwrap()
});

/// Whether a probe value carries information: not null, not an empty
/// string, not zero, not `false`, not an empty container.
pub fn is_filled(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Json::String(s) => !s.is_empty(),
        Json::Array(a) => !a.is_empty(),
        Json::Object(o) => !o.is_empty(),
    }
}

/// Value of the first key in `keys` that is present and filled.
pub fn first_filled<'a>(data: &'a Json, keys: &[&str]) -> Option<&'a Json> {
    keys.iter()
        .filter_map(|key| data.get(key))
        .find(|value| is_filled(value))
}

/// Walks a colon-separated path such as `format:tags:creation_time`.
pub fn resolve_path<'a>(data: &'a Json, path: &str) -> Option<&'a Json> {
    path.split(':').try_fold(data, |node, key| node.get(key))
}

/// First filled value among colon-separated `paths`.
pub fn first_filled_path<'a>(data: &'a Json, paths: &[&str]) -> Option<&'a Json> {
    paths
        .iter()
        .filter_map(|path| resolve_path(data, path))
        .find(|value| is_filled(value))
}

/// First filled value whose key matches `pattern`.
pub fn first_filled_matching<'a>(data: &'a Json, pattern: &Regex) -> Option<&'a Json> {
    data.as_object()?
        .iter()
        .filter(|(key, _)| pattern.is_match(key))
        .map(|(_, value)| value)
        .find(|value| is_filled(value))
}

/// Reads an integer from a number or a numeric string.
pub fn as_i64(value: &Json) -> Option<i64> {
    match value {
        Json::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a float from a number or a numeric string.
pub fn as_f64(value: &Json) -> Option<f64> {
    match value {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Renders a scalar probe value as text.
pub fn as_text(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Binary resources exiftool reported but did not inline, biggest first.
///
/// Returns `(tag, size_bytes)` where `tag` is the key without its group
/// prefix (`EXIF:ThumbnailImage` -> `ThumbnailImage`).
pub fn embedded_resources(exif: &Json) -> Vec<(String, u64)> {
    let mut found: Vec<(String, u64)> = exif
        .as_object()
        .into_iter()
        .flatten()
        .filter_map(|(key, value)| {
            let text = value.as_str()?;
            let size = BINARY_RESOURCE.captures(text)?.get(1)?.as_str().parse().ok()?;
            let tag = key.rsplit(':').next().unwrap_or(key);
            Some((tag.to_string(), size))
        })
        .collect();
    found.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_filled_skips_empty_values() {
        let data = json!({"EXIF:Model": "", "MakerNotes:CanonImageType": "Canon EOS 5D"});
        let found = first_filled(&data, &["EXIF:Model", "MakerNotes:CanonImageType"]);
        assert_eq!(found, Some(&json!("Canon EOS 5D")));
        assert_eq!(first_filled(&data, &["Missing"]), None);
    }

    #[test]
    fn test_zero_is_not_filled() {
        let data = json!({"File:ImageWidth": 0, "EXIF:ExifImageWidth": 4000});
        let found = first_filled(&data, &["File:ImageWidth", "EXIF:ExifImageWidth"]);
        assert_eq!(found, Some(&json!(4000)));
    }

    #[test]
    fn test_resolve_path() {
        let data = json!({"format": {"tags": {"creation_time": "2015-04-18T13:42:19.000000Z"}}});
        assert_eq!(
            resolve_path(&data, "format:tags:creation_time"),
            Some(&json!("2015-04-18T13:42:19.000000Z"))
        );
        assert_eq!(resolve_path(&data, "format:missing:x"), None);
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(as_i64(&json!("1920")), Some(1920));
        assert_eq!(as_i64(&json!(1080)), Some(1080));
        assert_eq!(as_f64(&json!("12.345000")), Some(12.345));
        assert_eq!(as_i64(&json!(null)), None);
    }

    #[test]
    fn test_embedded_resources_sorted_biggest_first() {
        let exif = json!({
            "EXIF:ThumbnailImage": "(Binary data 5000 bytes, use -b option to extract)",
            "Composite:PreviewImage": "(Binary data 90000 bytes, use -b option to extract)",
            "EXIF:Model": "Canon",
            "MakerNotes:Other": "(Binary data garbage)"
        });
        assert_eq!(
            embedded_resources(&exif),
            vec![
                ("PreviewImage".to_string(), 90000),
                ("ThumbnailImage".to_string(), 5000)
            ]
        );
    }

    #[test]
    fn test_first_filled_matching() {
        let data = json!({"Composite:GPSLatitude": "51 deg 50' 20.13\" N", "EXIF:Model": "x"});
        let re = Regex::new(r"(?i)GPSLatitude$").unwrap();
        assert_eq!(
            first_filled_matching(&data, &re),
            Some(&json!("51 deg 50' 20.13\" N"))
        );
    }
}
