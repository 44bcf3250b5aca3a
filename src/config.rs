use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::document::atomic_write;

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidConfig(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {e}"),
            ConfigError::Json(e) => write!(f, "JSON error: {e}"),
            ConfigError::InvalidConfig(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

// ── Defaults ────────────────────────────────────────────────────────

/// Attribute names eligible for cross-device calibration copying, in the
/// order they are applied when building a clone overlay. Collected from the
/// commissioning tool's daylight-harvesting parameter block.
const DEFAULT_CALIBRATION_KEYS: &[&str] = &[
    "map_daylight",
    "amb_env_gain",
    "amb_act_lev",
    "amb_cal_lev",
    "dh_amb_0",
    "dh_amb_1",
    "dh_amb_2",
    "dh_lev_0",
    "dh_lev_1",
    "dh_lev_2",
    "rampUpSpeed",
    "rampDownSpeed",
];

/// Element names treated as structured device records. Matched ASCII
/// case-insensitively against tag names in the file.
const DEFAULT_ELEMENTS: &[&str] = &["PMU"];

fn default_calibration_keys() -> Vec<String> {
    DEFAULT_CALIBRATION_KEYS
        .iter()
        .map(|k| (*k).to_string())
        .collect()
}

fn default_elements() -> Vec<String> {
    DEFAULT_ELEMENTS.iter().map(|e| (*e).to_string()).collect()
}

// ── Tool configuration ──────────────────────────────────────────────

/// Tunable knowledge about the .map format: which elements carry device
/// records and which attributes count as calibration data. Everything else
/// the engine needs is derived from the file itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ToolConfig {
    /// Ordered whitelist used when copying calibration values between devices.
    #[serde(default = "default_calibration_keys")]
    pub calibration_keys: Vec<String>,
    /// Recognized structured element names (case-insensitive match).
    #[serde(default = "default_elements")]
    pub elements: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            calibration_keys: default_calibration_keys(),
            elements: default_elements(),
        }
    }
}

impl ToolConfig {
    /// True if `key` is part of the calibration whitelist (exact match).
    #[must_use]
    pub fn is_calibration_key(&self, key: &str) -> bool {
        self.calibration_keys.iter().any(|k| k == key)
    }

    /// True if `name` names a recognized structured element.
    #[must_use]
    pub fn is_element(&self, name: &str) -> bool {
        self.elements.iter().any(|e| e.eq_ignore_ascii_case(name))
    }
}

/// Load a config from a JSON file. Omitted fields fall back to the built-in
/// defaults; a config that can match nothing (empty key list or empty element
/// list) is rejected. That is a user mistake worth surfacing before any file
/// is processed.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    let data = std::fs::read_to_string(path)?;
    let config: ToolConfig = serde_json::from_str(&data)?;
    if config.calibration_keys.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "calibration_keys must not be empty".to_string(),
        ));
    }
    if config.elements.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "elements must not be empty".to_string(),
        ));
    }
    Ok(config)
}

/// Write a config as pretty JSON (atomic write).
pub fn save_config(path: &Path, config: &ToolConfig) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config)?;
    atomic_write(path, json.as_bytes())?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_nonempty_and_ordered() {
        let config = ToolConfig::default();
        assert!(!config.calibration_keys.is_empty());
        assert_eq!(config.calibration_keys[0], "map_daylight");
        assert_eq!(config.elements, vec!["PMU"]);
    }

    #[test]
    fn element_match_is_case_insensitive() {
        let config = ToolConfig::default();
        assert!(config.is_element("PMU"));
        assert!(config.is_element("pmu"));
        assert!(config.is_element("Pmu"));
        assert!(!config.is_element("PMUX"));
    }

    #[test]
    fn calibration_key_match_is_exact() {
        let config = ToolConfig::default();
        assert!(config.is_calibration_key("map_daylight"));
        assert!(!config.is_calibration_key("MAP_DAYLIGHT"));
        assert!(!config.is_calibration_key("unrelated_field"));
    }

    #[test]
    fn save_then_load_round_trip() {
        let dir = std::env::temp_dir().join("mapconfig_test_config_roundtrip");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let config = ToolConfig {
            calibration_keys: vec!["map_daylight".to_string(), "dh_amb_0".to_string()],
            elements: vec!["PMU".to_string(), "SENSOR".to_string()],
        };
        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).expect("load failed");
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_key_list_rejected() {
        let dir = std::env::temp_dir().join("mapconfig_test_config_empty");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        std::fs::write(&path, r#"{"calibration_keys": [], "elements": ["PMU"]}"#).unwrap();
        let result = load_config(&path);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("calibration_keys"),
            "Expected key-list error, got: {err}"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn omitted_fields_fall_back_to_defaults() {
        let dir = std::env::temp_dir().join("mapconfig_test_config_partial");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        std::fs::write(&path, r#"{"elements": ["Sensor"]}"#).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.elements, vec!["Sensor"]);
        assert_eq!(loaded.calibration_keys, ToolConfig::default().calibration_keys);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("mapconfig_test_config_missing/nope.json");
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
    }
}
