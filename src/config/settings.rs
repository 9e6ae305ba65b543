//! Settings file management.
//!
//! Loads optional settings from `~/.tokensync/config.json`. Every field is
//! optional; command-line flags and environment variables take precedence.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::source::NotionConfig;
use crate::sync::DEFAULT_PROGRESS_INTERVAL;
use crate::tokens::{parse_override, FieldMapping};

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "Design Tokens";

/// Contents of `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub notion_token: Option<String>,
    /// API base, or a proxy that adds authentication itself.
    pub notion_base_url: Option<String>,
    pub notion_version: Option<String>,
    pub database_id: Option<String>,
    pub collection: Option<String>,
    /// Token property → record field overrides.
    pub field_mapping: HashMap<String, String>,
    pub progress_interval: Option<usize>,
}

/// Get the settings file path.
fn config_path() -> Result<PathBuf> {
    super::global_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Load settings from the default location.
///
/// A missing file yields defaults.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<Settings> {
    load_config_from(&config_path()?)
}

/// Load settings from an explicit path.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

impl Settings {
    /// Document-source connection settings.
    ///
    /// Priority for each field: environment → settings file → default.
    #[must_use]
    pub fn notion_config(&self) -> NotionConfig {
        self.notion_config_with(
            non_empty_env("NOTION_TOKEN"),
            non_empty_env("TOKENSYNC_NOTION_URL"),
        )
    }

    fn notion_config_with(&self, env_token: Option<String>, env_url: Option<String>) -> NotionConfig {
        let defaults = NotionConfig::default();
        NotionConfig {
            base_url: env_url
                .or_else(|| self.notion_base_url.clone())
                .unwrap_or(defaults.base_url),
            token: env_token.or_else(|| self.notion_token.clone()),
            version: self.notion_version.clone().unwrap_or(defaults.version),
        }
    }

    /// Database to read from: flag, then settings file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if neither names a database.
    pub fn database_id(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .map(ToString::to_string)
            .or_else(|| self.database_id.clone())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "No database configured. Pass --database or set `database_id` in ~/.tokensync/config.json"
                        .into(),
                )
            })
    }

    /// Target collection: flag, then settings file, then the default.
    #[must_use]
    pub fn collection(&self, explicit: Option<&str>) -> String {
        explicit
            .map(ToString::to_string)
            .or_else(|| self.collection.clone())
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string())
    }

    /// Field mapping: defaults, then settings-file overrides, then `--map` flags.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for a malformed flag or unknown property.
    pub fn field_mapping(&self, overrides: &[String]) -> Result<FieldMapping> {
        let mut mapping = FieldMapping::default();
        mapping.apply(&self.field_mapping)?;
        for spec in overrides {
            let (property, field) = parse_override(spec)?;
            mapping.set(&property, &field)?;
        }
        Ok(mapping)
    }

    #[must_use]
    pub fn progress_interval(&self) -> usize {
        self.progress_interval.unwrap_or(DEFAULT_PROGRESS_INTERVAL)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = load_config_from(&temp.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.collection(None), DEFAULT_COLLECTION);
        assert_eq!(settings.progress_interval(), DEFAULT_PROGRESS_INTERVAL);
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"database_id": "db1", "collection": "Brand", "field_mapping": {"name": "Token"}}"#,
        )
        .unwrap();

        let settings = load_config_from(&path).unwrap();
        assert_eq!(settings.database_id(None).unwrap(), "db1");
        assert_eq!(settings.database_id(Some("db2")).unwrap(), "db2");
        assert_eq!(settings.collection(None), "Brand");
        assert_eq!(settings.collection(Some("Other")), "Other");
        assert_eq!(settings.field_mapping(&[]).unwrap().name, "Token");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_config_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_database_id() {
        let settings = Settings::default();
        assert!(matches!(settings.database_id(None), Err(Error::Config(_))));
        assert!(settings.database_id(Some("  ")).is_err());
    }

    #[test]
    fn test_flag_overrides_beat_file_overrides() {
        let settings = Settings {
            field_mapping: HashMap::from([("value".to_string(), "Raw".to_string())]),
            ..Settings::default()
        };
        let mapping = settings
            .field_mapping(&["value=Hex".to_string(), "group=Category".to_string()])
            .unwrap();
        assert_eq!(mapping.value, "Hex");
        assert_eq!(mapping.group, "Category");
        assert!(settings.field_mapping(&["bogus".to_string()]).is_err());
    }

    #[test]
    fn test_notion_config_priority() {
        let settings = Settings {
            notion_token: Some("file-token".into()),
            notion_base_url: Some("http://proxy.local".into()),
            ..Settings::default()
        };

        let from_file = settings.notion_config_with(None, None);
        assert_eq!(from_file.token.as_deref(), Some("file-token"));
        assert_eq!(from_file.base_url, "http://proxy.local");
        assert_eq!(from_file.version, NotionConfig::default().version);

        let from_env = settings.notion_config_with(Some("env-token".into()), Some("http://env".into()));
        assert_eq!(from_env.token.as_deref(), Some("env-token"));
        assert_eq!(from_env.base_url, "http://env");

        let bare = Settings::default().notion_config_with(None, None);
        assert!(bare.token.is_none());
        assert_eq!(bare.base_url, NotionConfig::default().base_url);
    }
}
