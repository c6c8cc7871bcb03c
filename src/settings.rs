use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatementError};
use crate::models::Category;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Maximum standard deviation of amounts within a recurring group.
    #[serde(default = "default_recurrence_tolerance")]
    pub recurrence_tolerance: f64,
    /// Encoding labels tried in order when decoding delimited text.
    #[serde(default = "default_encodings")]
    pub encodings: Vec<String>,
    /// Read ambiguous numeric dates as DD/MM/YYYY.
    #[serde(default)]
    pub day_first: bool,
    /// Extra keywords appended to the built-in category rules.
    #[serde(default)]
    pub extra_keywords: BTreeMap<Category, Vec<String>>,
}

fn default_currency() -> String {
    "NGN".to_string()
}

fn default_recurrence_tolerance() -> f64 {
    10.0
}

fn default_encodings() -> Vec<String> {
    vec!["utf-8".to_string(), "windows-1252".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            recurrence_tolerance: default_recurrence_tolerance(),
            encodings: default_encodings(),
            day_first: false,
            extra_keywords: BTreeMap::new(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("penny")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unparsable files give the defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring unreadable settings at {}: {e}", path.display());
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| StatementError::Other(format!("Settings error: {e}")))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".config").join("penny").join("settings.json");
        let mut settings = Settings {
            default_currency: "USD".to_string(),
            recurrence_tolerance: 5.0,
            ..Settings::default()
        };
        settings
            .extra_keywords
            .insert(Category::Transport, vec!["bolt".to_string()]);
        settings.day_first = true;
        save_settings_to(&settings, &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("}\n"));
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.default_currency, "USD");
        assert_eq!(loaded.recurrence_tolerance, 5.0);
        assert_eq!(loaded.extra_keywords[&Category::Transport], vec!["bolt"]);
        assert!(loaded.day_first);
    }

    #[test]
    fn test_load_missing_or_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_settings_from(&dir.path().join("absent.json"));
        assert_eq!(missing.default_currency, "NGN");
        let broken = dir.path().join("settings.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let loaded = load_settings_from(&broken);
        assert_eq!(loaded.default_currency, "NGN");
        assert_eq!(loaded.recurrence_tolerance, 10.0);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.default_currency, "NGN");
        assert_eq!(s.recurrence_tolerance, 10.0);
        assert_eq!(s.encodings, vec!["utf-8", "windows-1252"]);
        assert!(!s.day_first);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"default_currency": "GBP", "extra_keywords": {"Food & Dining": ["chicken republic"]}}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.default_currency, "GBP");
        assert_eq!(s.recurrence_tolerance, 10.0);
        assert_eq!(s.extra_keywords[&Category::FoodDining], vec!["chicken republic"]);
    }
}
