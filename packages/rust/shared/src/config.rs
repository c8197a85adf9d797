//! Application configuration for reqminer.
//!
//! User config lives at `~/.reqminer/reqminer.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ReqMinerError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "reqminer.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".reqminer";

/// Default model profile store file name (inside the config directory).
const PROFILES_FILE_NAME: &str = "model_profiles.json";

/// Characters assumed per word when converting char budgets to word budgets.
pub const CHARS_PER_WORD: usize = 4;

// ---------------------------------------------------------------------------
// Config structs (matching reqminer.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Ollama inference endpoint settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Chunk window sizing.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Model profile store location.
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Base folder holding one sub-folder of documents per project.
    #[serde(default = "default_docs_root")]
    pub docs_root: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            docs_root: default_docs_root(),
        }
    }
}

fn default_docs_root() -> String {
    "~/reqminer-docs".into()
}

/// `[ollama]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for every generation call.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature. Kept low for extraction fidelity.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens generated per call (`num_predict`).
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            num_predict: default_num_predict(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "phi3".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_num_predict() -> u32 {
    1000
}
fn default_timeout_secs() -> u64 {
    60
}

/// `[chunking]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Nominal chunk size in characters.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Overlap between consecutive chunks in characters.
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_max_chunk_chars() -> usize {
    1200
}
fn default_overlap_chars() -> usize {
    250
}

/// `[profiles]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilesConfig {
    /// Path to the JSON profile store. Defaults to `~/.reqminer/model_profiles.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Chunk window sizing, expressed in characters and converted to words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub max_chunk_chars: usize,
    pub overlap_chars: usize,
}

impl ChunkConfig {
    pub fn new(max_chunk_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chunk_chars,
            overlap_chars,
        }
    }

    /// Words per chunk window.
    pub fn words_per_chunk(&self) -> usize {
        self.max_chunk_chars / CHARS_PER_WORD
    }

    /// Words shared between consecutive windows.
    pub fn words_overlap(&self) -> usize {
        self.overlap_chars / CHARS_PER_WORD
    }

    /// Reject configurations whose window would never advance.
    pub fn validate(&self) -> Result<()> {
        let per_chunk = self.words_per_chunk();
        let overlap = self.words_overlap();
        if per_chunk == 0 {
            return Err(ReqMinerError::validation(format!(
                "max_chunk_chars ({}) is below one word ({CHARS_PER_WORD} chars)",
                self.max_chunk_chars
            )));
        }
        if per_chunk <= overlap {
            return Err(ReqMinerError::validation(format!(
                "words_per_chunk ({per_chunk}) must exceed words_overlap ({overlap}); \
                 lower overlap_chars or raise max_chunk_chars"
            )));
        }
        Ok(())
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::from(&ChunkingConfig::default())
    }
}

impl From<&ChunkingConfig> for ChunkConfig {
    fn from(config: &ChunkingConfig) -> Self {
        Self::new(config.max_chunk_chars, config.overlap_chars)
    }
}

impl From<&AppConfig> for ChunkConfig {
    fn from(config: &AppConfig) -> Self {
        Self::from(&config.chunking)
    }
}

/// Runtime inference configuration handed to the HTTP client.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: Url,
    pub model: String,
    pub temperature: f32,
    pub num_predict: u32,
    pub timeout: Duration,
}

impl TryFrom<&OllamaConfig> for InferenceConfig {
    type Error = ReqMinerError;

    fn try_from(config: &OllamaConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ReqMinerError::config(format!("invalid ollama base_url '{}': {e}", config.base_url))
        })?;
        if config.model.trim().is_empty() {
            return Err(ReqMinerError::config("ollama model must not be empty"));
        }
        Ok(Self {
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            num_predict: config.num_predict,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

impl TryFrom<&AppConfig> for InferenceConfig {
    type Error = ReqMinerError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Self::try_from(&config.ollama)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.reqminer/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReqMinerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.reqminer/reqminer.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the profile store path from config, falling back to the config dir.
pub fn profiles_file_path(config: &AppConfig) -> Result<PathBuf> {
    match &config.profiles.path {
        Some(p) => Ok(expand_home(p)),
        None => Ok(config_dir()?.join(PROFILES_FILE_NAME)),
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
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
    let content = std::fs::read_to_string(path).map_err(|e| ReqMinerError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ReqMinerError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ReqMinerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ReqMinerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ReqMinerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("docs_root"));
        assert!(toml_str.contains("localhost:11434"));
        assert!(toml_str.contains("max_chunk_chars"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[ollama]
model = "llama3"

[chunking]
overlap_chars = 100
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.ollama.model, "llama3");
        assert_eq!(config.ollama.num_predict, 1000);
        assert_eq!(config.ollama.timeout_secs, 60);
        assert_eq!(config.chunking.max_chunk_chars, 1200);
        assert_eq!(config.chunking.overlap_chars, 100);
        assert!(config.profiles.path.is_none());
    }

    #[test]
    fn chunk_config_word_budgets() {
        let chunk = ChunkConfig::default();
        assert_eq!(chunk.words_per_chunk(), 300);
        assert_eq!(chunk.words_overlap(), 62);
        assert!(chunk.validate().is_ok());
    }

    #[test]
    fn chunk_config_rejects_non_advancing_window() {
        let err = ChunkConfig::new(100, 100).validate().unwrap_err();
        assert!(err.to_string().contains("must exceed"));

        assert!(ChunkConfig::new(100, 120).validate().is_err());
        assert!(ChunkConfig::new(3, 0).validate().is_err());
    }

    #[test]
    fn inference_config_from_app_config() {
        let app = AppConfig::default();
        let inference = InferenceConfig::try_from(&app).expect("valid defaults");
        assert_eq!(inference.model, "phi3");
        assert_eq!(inference.timeout, Duration::from_secs(60));
        assert_eq!(inference.base_url.as_str(), "http://localhost:11434/");
    }

    #[test]
    fn inference_config_rejects_bad_url() {
        let mut app = AppConfig::default();
        app.ollama.base_url = "not a url".into();
        let err = InferenceConfig::try_from(&app).unwrap_err();
        assert!(err.to_string().contains("invalid ollama base_url"));
    }

    #[test]
    fn profiles_path_override() {
        let mut app = AppConfig::default();
        app.profiles.path = Some("/srv/profiles.json".into());
        assert_eq!(
            profiles_file_path(&app).unwrap(),
            PathBuf::from("/srv/profiles.json")
        );
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/data/docs"), PathBuf::from("/data/docs"));
    }
}
