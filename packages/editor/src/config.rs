use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "stylecascade.config.json";

/// Style engine configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Deepest outline level whose counter reset flag is persisted
    #[serde(default = "default_max_outline_level")]
    pub max_outline_level: u32,

    /// Prefix of the persisted counter flag keys
    #[serde(default = "default_counter_key_prefix")]
    pub counter_key_prefix: String,

    /// Insert fillers and relevel paragraphs to keep the outline contiguous
    #[serde(default = "default_repair_hierarchy")]
    pub repair_hierarchy: bool,
}

fn default_max_outline_level() -> u32 {
    10
}

fn default_counter_key_prefix() -> String {
    "set-cust-style-counter-".to_string()
}

fn default_repair_hierarchy() -> bool {
    true
}

impl EngineConfig {
    /// Load config from a directory
    pub fn load(dir: &Path) -> Result<Self, EngineError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            // Return default config if none exists
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Persisted key of the counter for `level`
    pub fn counter_key(&self, level: u32) -> String {
        format!("{}{}", self.counter_key_prefix, level)
    }

    /// Level encoded in a persisted counter key
    pub fn level_of_counter_key(&self, key: &str) -> Option<u32> {
        key.strip_prefix(&self.counter_key_prefix)?
            .parse::<u32>()
            .ok()
            .filter(|level| (1..=self.max_outline_level).contains(level))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_outline_level: default_max_outline_level(),
            counter_key_prefix: default_counter_key_prefix(),
            repair_hierarchy: default_repair_hierarchy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "maxOutlineLevel": 6,
            "repairHierarchy": false
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_outline_level, 6);
        assert!(!config.repair_hierarchy);
        assert_eq!(config.counter_key_prefix, "set-cust-style-counter-");
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_outline_level, 10);
        assert!(config.repair_hierarchy);
    }

    #[test]
    fn test_counter_keys() {
        let config = EngineConfig::default();
        assert_eq!(config.counter_key(3), "set-cust-style-counter-3");
        assert_eq!(config.level_of_counter_key("set-cust-style-counter-3"), Some(3));
        assert_eq!(config.level_of_counter_key("set-cust-style-counter-11"), None);
        assert_eq!(config.level_of_counter_key("other-3"), None);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "counterKeyPrefix": "counter-" }"#,
        )
        .unwrap();

        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.counter_key(2), "counter-2");
    }
}
