//! Source backend configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FILE_BASE_DIR, DEFAULT_SOURCE_BACKEND};

fn default_source_backend() -> String {
    DEFAULT_SOURCE_BACKEND.to_string()
}

fn default_allowed_backends() -> Vec<String> {
    vec![DEFAULT_SOURCE_BACKEND.to_string()]
}

fn default_base_dir() -> String {
    DEFAULT_FILE_BASE_DIR.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Backend invoked when no registered backend claims a URL
    #[serde(default = "default_source_backend")]
    pub default: String,
    /// Backends registered at startup (the default is always registered)
    #[serde(default = "default_allowed_backends")]
    pub allowed: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            default: default_source_backend(),
            allowed: default_allowed_backends(),
        }
    }
}

impl SourceConfig {
    /// Whether `name` should be registered in the backend registry
    pub fn is_enabled(&self, name: &str) -> bool {
        self.default == name || self.allowed.iter().any(|a| a == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    #[serde(default)]
    pub region: Option<String>,
    /// Bucket used for bare keys
    #[serde(default)]
    pub bucket: Option<String>,
    /// Key prefix prepended to bare keys
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}
