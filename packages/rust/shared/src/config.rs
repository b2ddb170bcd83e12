//! Application configuration for the DeFi trainer.
//!
//! User config lives at `~/.defi-trainer/defi-trainer.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TrainerError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "defi-trainer.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".defi-trainer";

/// Model identifier sent to the local server by default.
pub const DEFAULT_MODEL: &str = "text-embedding-nomic-embed-text-v1.5";

// ---------------------------------------------------------------------------
// Config structs (matching defi-trainer.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Local model server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Input/output and embedding limits.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Post-run verification call.
    #[serde(default)]
    pub smoke_test: SmokeTestConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the OpenAI-compatible server (LM Studio style).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent to `/v1/embeddings`.
    #[serde(default = "default_model")]
    pub embedding_model: String,

    /// Model identifier sent to `/v1/chat/completions`.
    #[serde(default = "default_model")]
    pub chat_model: String,

    /// Per-request timeout for embedding calls.
    #[serde(default = "default_embedding_timeout")]
    pub embedding_timeout_secs: u64,

    /// Per-request timeout for the chat-completion call.
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embedding_model: default_model(),
            chat_model: default_model(),
            embedding_timeout_secs: default_embedding_timeout(),
            chat_timeout_secs: default_chat_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:1234".into()
}
fn default_model() -> String {
    DEFAULT_MODEL.into()
}
fn default_embedding_timeout() -> u64 {
    30
}
fn default_chat_timeout() -> u64 {
    60
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Knowledge-base document to read.
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,

    /// Output artifact path (overwritten on each run).
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Context texts are cut to this many characters before embedding.
    #[serde(default = "default_max_embed_chars")]
    pub max_embed_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
            max_embed_chars: default_max_embed_chars(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("../training-data/solana-defi-training.json")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("solana-defi-training-output.json")
}
fn default_max_embed_chars() -> usize {
    8000
}

/// `[smoke_test]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmokeTestConfig {
    /// Whether to issue the chat-completion check after writing output.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sample question sent as the user message.
    #[serde(default = "default_question")]
    pub question: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for SmokeTestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            question: default_question(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_question() -> String {
    "What are the best arbitrage opportunities on Solana right now?".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    500
}

// ---------------------------------------------------------------------------
// Derived endpoints
// ---------------------------------------------------------------------------

/// Endpoint URLs resolved once from `server.base_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub embeddings: Url,
    pub chat_completions: Url,
}

impl Endpoints {
    /// Resolve `/v1/embeddings` and `/v1/chat/completions` against a base URL.
    pub fn from_base(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| TrainerError::config(format!("invalid base_url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(TrainerError::config(format!(
                "base_url '{base_url}' cannot carry a path"
            )));
        }

        let join = |path: &str| {
            base.join(path)
                .map_err(|e| TrainerError::config(format!("cannot join '{path}': {e}")))
        };

        Ok(Self {
            embeddings: join("/v1/embeddings")?,
            chat_completions: join("/v1/chat/completions")?,
        })
    }
}

impl TrainerConfig {
    /// Endpoint URLs for this config.
    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::from_base(&self.server.base_url)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.endpoints()?;

        if self.pipeline.max_embed_chars == 0 {
            return Err(TrainerError::config("pipeline.max_embed_chars must be > 0"));
        }
        if self.server.embedding_timeout_secs == 0 || self.server.chat_timeout_secs == 0 {
            return Err(TrainerError::config("server timeouts must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.smoke_test.temperature) {
            return Err(TrainerError::config(format!(
                "smoke_test.temperature {} outside 0.0..=2.0",
                self.smoke_test.temperature
            )));
        }
        if self.smoke_test.max_tokens == 0 {
            return Err(TrainerError::config("smoke_test.max_tokens must be > 0"));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.defi-trainer/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TrainerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.defi-trainer/defi-trainer.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<TrainerConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(TrainerConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<TrainerConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TrainerError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TrainerError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TrainerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = TrainerConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TrainerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TrainerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
