//! Ouderschapsplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Session and output configuration
    pub session: SessionConfig,
}

impl Config {
    /// Validate configuration before a chat starts
    ///
    /// Checks that the API key environment variable is set so a missing key
    /// fails before the first turn rather than in the middle of it.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .ouderschapsplan.yml
        let local_config = PathBuf::from(".ouderschapsplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/ouderschapsplan/ouderschapsplan.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ouderschapsplan").join("ouderschapsplan.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
///
/// Keys left out of the file take the defaults of the chosen provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "LlmConfigFile")]
pub struct LlmConfig {
    /// Provider name ("gemini" or "openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::for_provider("gemini")
    }
}

impl LlmConfig {
    /// Defaults for a provider; unknown providers get the Gemini endpoint
    pub fn for_provider(provider: &str) -> Self {
        let (model, api_key_env, base_url) = match provider {
            "openai" => ("gpt-4o-mini", "OPENAI_API_KEY", "https://api.openai.com"),
            _ => (
                "gemini-2.5-flash",
                "GEMINI_API_KEY",
                "https://generativelanguage.googleapis.com",
            ),
        };
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            api_key_env: api_key_env.to_string(),
            base_url: base_url.to_string(),
            max_tokens: 8192,
            temperature: 0.4,
            timeout_ms: 120_000,
        }
    }

    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).context(format!("Environment variable {} is not set", self.api_key_env))
    }
}

/// `llm` section as written in the file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmConfigFile {
    provider: Option<String>,
    model: Option<String>,
    #[serde(rename = "api-key-env")]
    api_key_env: Option<String>,
    #[serde(rename = "base-url")]
    base_url: Option<String>,
    #[serde(rename = "max-tokens")]
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    #[serde(rename = "timeout-ms")]
    timeout_ms: Option<u64>,
}

impl From<LlmConfigFile> for LlmConfig {
    fn from(file: LlmConfigFile) -> Self {
        let defaults = Self::for_provider(file.provider.as_deref().unwrap_or("gemini"));
        Self {
            provider: defaults.provider,
            model: file.model.unwrap_or(defaults.model),
            api_key_env: file.api_key_env.unwrap_or(defaults.api_key_env),
            base_url: file.base_url.unwrap_or(defaults.base_url),
            max_tokens: file.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: file.temperature.unwrap_or(defaults.temperature),
            timeout_ms: file.timeout_ms.unwrap_or(defaults.timeout_ms),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name the parent is addressed by in prompts and documents
    #[serde(rename = "parent-name")]
    pub parent_name: String,

    /// Question template file; the embedded template is used when unset
    #[serde(rename = "questions-path")]
    pub questions_path: Option<PathBuf>,

    /// Directory with prompt template overrides
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,

    /// Where exported conversations are saved
    #[serde(rename = "conversations-dir")]
    pub conversations_dir: PathBuf,

    /// Where PDF documents are written
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/ouderschapsplan on Linux)
        let conversations_dir = dirs::data_dir()
            .map(|d| d.join("ouderschapsplan"))
            .unwrap_or_else(|| PathBuf::from(".ouderschapsplan"))
            .join("conversations");

        Self {
            parent_name: "Sandra".to_string(),
            questions_path: None,
            prompts_dir: None,
            conversations_dir,
            output_dir: PathBuf::from("."),
        }
    }
}
