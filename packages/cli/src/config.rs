use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use stylecascade_editor::{EngineConfig, DEFAULT_CONFIG_NAME};

/// Project section of `stylecascade.config.json`
///
/// Engine settings live in the same file and are read through the
/// flattened [`EngineConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// JSON file holding the style list
    #[serde(default = "default_styles")]
    pub styles: String,

    /// Directory searched for documents
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// File name suffix identifying documents
    #[serde(default = "default_document_suffix")]
    pub document_suffix: String,

    #[serde(flatten)]
    pub engine: EngineConfig,
}

fn default_styles() -> String {
    "styles.json".to_string()
}

fn default_docs_dir() -> String {
    "docs".to_string()
}

fn default_document_suffix() -> String {
    ".doc.json".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Absolute path of the style list
    pub fn get_styles_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.styles)
    }

    /// Absolute path of the documents directory
    pub fn get_docs_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.docs_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            styles: default_styles(),
            docs_dir: default_docs_dir(),
            document_suffix: default_document_suffix(),
            engine: EngineConfig::default(),
        }
    }
}
