use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV: &str = "CHARTSMITH_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "chartsmith.toml";

// ---------------------------------------------------------------------------
// Configuration sections
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub entities: EntitiesConfig,
    pub text_generation: TextGenerationConfig,
    pub http: HttpConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    Http,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    /// Root directory of the local backend.
    pub root: PathBuf,
    /// Base URL of the HTTP backend.
    pub endpoint: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            bucket: "uploads".to_string(),
            root: PathBuf::from("object-store"),
            endpoint: "http://localhost:9000".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EntitiesConfig {
    pub endpoint: String,
    pub language: String,
    pub api_key: Option<String>,
}

impl Default for EntitiesConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081/detect-entities".to_string(),
            language: "en".to_string(),
            api_key: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TextGenerationConfig {
    pub endpoint: String,
    pub model_id: String,
    pub api_key: Option<String>,
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8082".to_string(),
            model_id: "claude-3-sonnet".to_string(),
            api_key: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout_seconds: Option<u64>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn default_config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load the configured file; a missing file means defaults, a malformed
    /// one is an error.
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        log::info!("Loading config from {}", path.display());
        Self::load_from_file(&path)
    }
}
