//! Table-driven tests for configuration loading and validation.

use std::path::PathBuf;

use photopipe::config::load_config_from_str;
use photopipe::pipeline::ProcessingSettings;

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{"version": "1.0", "media_root": "/srv/media"}"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "database_path": "/var/lib/photopipe/photopipe.db",
            "media_root": "/srv/media",
            "timezone": "Europe/Berlin",
            "worker_count": 4,
            "thumbnail": {"size": 320, "quality": 80},
            "screenshot_second": 3,
            "tools": {"exiftool": "/opt/bin/exiftool", "ffprobe": "ffprobe", "ffmpeg": "ffmpeg"},
            "events": {"capacity": 64}
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "missing_media_root",
        config_json: r#"{"version": "1.0"}"#,
        should_succeed: false,
        expected_error: Some("media_root"),
    },
    ConfigTestCase {
        name: "unknown_top_level_key",
        config_json: r#"{"version": "1.0", "media_root": "/m", "input_directory": "/in"}"#,
        should_succeed: false,
        expected_error: Some("input_directory"),
    },
    ConfigTestCase {
        name: "unsupported_version",
        config_json: r#"{"version": "2.0", "media_root": "/m"}"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "unknown_timezone",
        config_json: r#"{"version": "1.0", "media_root": "/m", "timezone": "Mars/Olympus"}"#,
        should_succeed: false,
        expected_error: Some("Mars/Olympus"),
    },
    ConfigTestCase {
        name: "zero_workers",
        config_json: r#"{"version": "1.0", "media_root": "/m", "worker_count": 0}"#,
        should_succeed: false,
        expected_error: Some("Schema validation failed"),
    },
    ConfigTestCase {
        name: "quality_out_of_range",
        config_json: r#"{"version": "1.0", "media_root": "/m", "thumbnail": {"quality": 101}}"#,
        should_succeed: false,
        expected_error: Some("101"),
    },
    ConfigTestCase {
        name: "invalid_json",
        config_json: r#"{"version": "1.0", "media_root": "/m""#,
        should_succeed: false,
        expected_error: None,
    },
];

#[test]
fn test_json_config_loading() {
    let mut failures = Vec::new();

    for case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);

        match (result, case.should_succeed) {
            (Ok(_), true) => {}
            (Ok(_), false) => {
                failures.push(format!("{}: expected failure but succeeded", case.name));
            }
            (Err(e), true) => {
                failures.push(format!("{}: expected success but failed: {}", case.name, e));
            }
            (Err(e), false) => {
                if let Some(expected) = case.expected_error {
                    let message = e.to_string();
                    if !message.contains(expected) {
                        failures.push(format!(
                            "{}: error '{}' does not contain '{}'",
                            case.name, message, expected
                        ));
                    }
                }
            }
        }
    }

    assert!(failures.is_empty(), "Failed cases:\n{}", failures.join("\n"));
}

#[test]
fn test_full_config_reaches_processing_settings() {
    let config = load_config_from_str(JSON_CONFIG_TESTS[1].config_json).unwrap();

    assert_eq!(
        config.database_path(),
        Some(PathBuf::from("/var/lib/photopipe/photopipe.db"))
    );
    assert_eq!(config.tools.exiftool, "/opt/bin/exiftool");
    assert_eq!(config.events.capacity, 64);

    let settings = ProcessingSettings::from_config(&config);
    assert_eq!(settings.timezone, chrono_tz::Europe::Berlin);
    assert_eq!(settings.thumbnail_size, 320);
    assert_eq!(settings.thumbnail_quality, 80);
    assert_eq!(settings.screenshot_second, 3);
}

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("photopipe.json");
    std::fs::write(&path, JSON_CONFIG_TESTS[0].config_json).unwrap();

    let config = photopipe::load_config(&path).unwrap();
    assert_eq!(config.media_root, PathBuf::from("/srv/media"));
    assert_eq!(config.thumbnail.size, 160);

    let missing = photopipe::load_config(dir.path().join("nope.json"));
    assert!(missing.is_err());
}
