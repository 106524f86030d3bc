//! Configuration loading and management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ai: AiConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".taskboard/board.db")
}

fn default_port() -> u16 {
    3000
}

/// Which completion provider to use for the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Pick whichever provider has a key configured (OpenAI first).
    Auto,
    Openai,
    Anthropic,
}

impl Default for ProviderKind {
    fn default() -> Self {
        ProviderKind::Auto
    }
}

/// Assistant provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// API keys. Usually supplied via OPENAI_API_KEY / ANTHROPIC_API_KEY
    /// rather than the config file.
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            openai_api_key: None,
            anthropic_api_key: None,
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-opus-20240229".to_string()
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default location or return defaults,
    /// then apply environment overrides.
    pub fn load_or_default() -> Self {
        let mut config = Self::load(".taskboard/config.yaml").unwrap_or_default();
        config.apply_env();
        config
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(db_path) = std::env::var("TASKBOARD_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Ok(port) = std::env::var("TASKBOARD_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.ai.openai_api_key = Some(key);
            }
        }

        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            if !key.is_empty() {
                self.ai.anthropic_api_key = Some(key);
            }
        }
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
