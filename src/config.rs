use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::keys::KeySet;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "SPECIFIC_KEYUP_CONFIG";

const DEFAULT_ELEMENT: &str = "search";
const DEFAULT_KEY: &str = "Enter";
const DEFAULT_EXTRA_KEYS: &[&str] = &["Escape"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read keyup config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Keys to filter on one element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Binding {
    pub element: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    pub keys: KeySet,
}

fn default_tag() -> String {
    String::from("input")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyupConfig {
    pub bindings: Vec<Binding>,
}

impl Default for KeyupConfig {
    fn default() -> Self {
        let keys = KeySet::from_parts(DEFAULT_KEY, DEFAULT_EXTRA_KEYS.iter().copied());
        Self {
            bindings: vec![Binding {
                element: DEFAULT_ELEMENT.to_string(),
                tag: default_tag(),
                keys,
            }],
        }
    }
}

impl KeyupConfig {
    /// Load from `config_path`, falling back to defaults when no path is
    /// given or the file does not exist.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                Ok(serde_yaml::from_str(&contents)?)
            }
            _ => Ok(Self::default()),
        }
    }
}
