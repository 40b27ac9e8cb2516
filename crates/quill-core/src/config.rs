//! Configuration — typed schema, file loading, and env var overrides.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.quill/config.json`
//! 3. `GEMINI_API_KEY` environment variable (overrides the file)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

// ─────────────────────────────────────────────
// Schema
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.quill/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub generation: GenerationConfig,
    pub server: ServerConfig,
}

/// Gemini API access settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// API base URL.
    pub api_base: String,
    /// Model identifier.
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}

impl GeminiConfig {
    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Generation bounds passed on every completion call.
///
/// Fixed service configuration — not user-controllable per request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    /// Maximum tokens to generate.
    pub max_output_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 1000,
            temperature: 0.9,
        }
    }
}

/// Relay server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Bind address for the relay endpoint.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Loader
// ─────────────────────────────────────────────

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be
/// parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    apply_env_overrides(load_config_from_path(&config_path))
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Apply environment variable overrides on top of the loaded config.
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            config.gemini.api_key = key;
        }
    }
    config
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    std::fs::write(&config_path, json)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.generation.max_output_tokens, 1000);
        assert_eq!(config.generation.temperature, 0.9);
        assert!(!config.gemini.is_configured());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config_from_path(&dir.path().join("absent.json"));
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json at all").unwrap();

        let config = load_config_from_path(&path);
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_camel_case_keys() {
        let json = r#"{"gemini": {"apiKey": "k", "model": "gemini-2.0-flash"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.gemini.api_key, "k");
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        // Unspecified sections fall back to defaults
        assert_eq!(config.generation.max_output_tokens, 1000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.gemini.api_key = "secret".to_string();
        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.gemini.api_key, "secret");
    }
}
