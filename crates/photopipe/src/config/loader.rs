use std::path::Path;

use chrono_tz::Tz;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.timezone.parse::<Tz>().is_err() {
        return Err(ConfigError::InvalidTimezone {
            name: config.timezone.clone(),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    if config.thumbnail.size == 0 {
        return Err(ConfigError::Validation {
            message: "thumbnail.size must be positive".to_string(),
        });
    }

    if !(1..=100).contains(&config.thumbnail.quality) {
        return Err(ConfigError::Validation {
            message: format!(
                "thumbnail.quality must be within 1..=100, got {}",
                config.thumbnail.quality
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config_applies_defaults() {
        let config = load_config_from_str(r#"{"version": "1.0", "media_root": "/srv/media"}"#)
            .unwrap();
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.thumbnail.size, 160);
        assert_eq!(config.thumbnail.quality, 95);
        assert_eq!(config.screenshot_second, 10);
        assert_eq!(config.tools.exiftool, "exiftool");
        assert!(config.worker_count > 0);
    }

    #[test]
    fn test_load_full_config() {
        let config = load_config_from_str(
            r#"{
                "version": "1.0",
                "database_path": "/var/lib/photopipe/media.db",
                "media_root": "/srv/media",
                "timezone": "Europe/Berlin",
                "worker_count": 3,
                "thumbnail": {"size": 320, "quality": 90},
                "screenshot_second": 5,
                "tools": {"exiftool": "/usr/local/bin/exiftool"},
                "events": {"capacity": 16}
            }"#,
        )
        .unwrap();
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.thumbnail.size, 320);
        assert_eq!(config.tools.exiftool, "/usr/local/bin/exiftool");
        assert_eq!(config.tools.ffprobe, "ffprobe");
        assert_eq!(config.events.capacity, 16);
        assert_eq!(
            config.database_path().unwrap(),
            std::path::PathBuf::from("/var/lib/photopipe/media.db")
        );
    }

    #[test]
    fn test_missing_media_root_fails_schema() {
        let err = load_config_from_str(r#"{"version": "1.0"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));
    }

    #[test]
    fn test_unknown_key_fails_schema() {
        let err = load_config_from_str(
            r#"{"version": "1.0", "media_root": "/m", "input_directory": "/x"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));
    }

    #[test]
    fn test_unsupported_version() {
        let err = load_config_from_str(r#"{"version": "2.0", "media_root": "/m"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_unknown_timezone() {
        let err = load_config_from_str(
            r#"{"version": "1.0", "media_root": "/m", "timezone": "Mars/Olympus"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimezone { name } if name == "Mars/Olympus"));
    }

    #[test]
    fn test_invalid_json() {
        let err = load_config_from_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson(_)));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/photopipe.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
