//! Application configuration for bookbinder.
//!
//! User config lives at `~/.bookbinder/bookbinder.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BookbinderError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bookbinder.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bookbinder";

// ---------------------------------------------------------------------------
// Config structs (matching bookbinder.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenAI settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Structure extraction tuning.
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default annotation model.
    #[serde(default = "default_model")]
    pub model: String,

    /// Language tag written into EPUB metadata and chapter documents.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            language: default_language(),
        }
    }
}

fn default_model() -> String {
    "gpt-4".into()
}
fn default_language() -> String {
    "es".into()
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the chat-completions API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_base: default_api_base(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Characters submitted in the initial analysis pass.
    #[serde(default = "default_analysis_window")]
    pub analysis_window: usize,

    /// Maximum characters per annotation chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            analysis_window: default_analysis_window(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_analysis_window() -> usize {
    4_000
}
fn default_chunk_size() -> usize {
    10_000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bookbinder/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BookbinderError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bookbinder/bookbinder.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BookbinderError::read(path, e))?;

    toml::from_str(&content)
        .map_err(|e| BookbinderError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| BookbinderError::write(format!("cannot create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BookbinderError::config(e.to_string()))?;

    std::fs::write(&path, content)
        .map_err(|e| BookbinderError::write(format!("cannot write {}: {e}", path.display())))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the OpenAI API key: an explicit value wins, otherwise the env var
/// named by the config. Both absent is a fatal configuration error — checked
/// before any processing begins.
pub fn resolve_api_key(explicit: Option<&str>, config: &AppConfig) -> Result<String> {
    if let Some(key) = explicit {
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    let var_name = &config.openai.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(BookbinderError::config(format!(
            "OpenAI API key not found. Pass --api-key or set the {var_name} environment variable."
        ))),
    }
}
