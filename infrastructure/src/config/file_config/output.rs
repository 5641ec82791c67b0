//! Output, logging and credential settings (`[output]`, `[logging]`, `[credentials]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Enable colored terminal output
    pub color: bool,
    /// Show a typing indicator while participants are busy
    pub show_typing: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_typing: true,
        }
    }
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Write a JSONL transcript of the conversation to this path
    pub conversation_log: Option<String>,
}

/// Raw credential store configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCredentialsConfig {
    /// Path of the credentials file
    pub path: Option<String>,
}

impl FileCredentialsConfig {
    /// Configured path, or `$XDG_DATA_HOME/roundtable/credentials.json`
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) => Some(expand_home(path)),
            None => dirs::data_dir().map(|d| d.join("roundtable").join("credentials.json")),
        }
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
