//! Bootstrap configuration loading and path resolution
//!
//! Configuration is layered, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (`AIWD_CONFIG`, `AIWD_DATABASE`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: the service logs a warning and starts
//! with compiled defaults. A TOML file that exists but fails to parse is an
//! error, since silently ignoring it would hide operator mistakes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "AIWD_CONFIG";
/// Environment variable naming the SQLite database file
pub const DATABASE_ENV_VAR: &str = "AIWD_DATABASE";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub grammar: GrammarConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed by CORS (the web frontend)
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frontend_url: default_frontend_url(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Scoring pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Text type used when a request does not name one
    #[serde(default = "default_text_type")]
    pub default_text_type: String,

    /// Number of generated comparison samples for the similarity scorer
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Upper bound on a single scorer invocation
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Simulate model latency in the placeholder scorers
    #[serde(default = "default_simulated_latency")]
    pub simulated_latency: bool,

    /// How many stored analyses the plagiarism check compares against
    #[serde(default = "default_plagiarism_corpus_limit")]
    pub plagiarism_corpus_limit: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_text_type: default_text_type(),
            sample_count: default_sample_count(),
            provider_timeout_ms: default_provider_timeout_ms(),
            simulated_latency: default_simulated_latency(),
            plagiarism_corpus_limit: default_plagiarism_corpus_limit(),
        }
    }
}

/// Generative sample client settings (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAiConfig {
    /// API key (lowest priority source: database and environment win)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_openai_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_openai_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_openai_max_retries")]
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            timeout_secs: default_openai_timeout_secs(),
            connect_timeout_secs: default_openai_connect_timeout_secs(),
            max_retries: default_openai_max_retries(),
        }
    }
}

/// Grammar checker settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrammarConfig {
    /// LanguageTool-compatible `/v2/check` endpoint; built-in rules when absent
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default = "default_grammar_language")]
    pub language: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            language: default_grammar_language(),
        }
    }
}

/// Admin surface settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminConfig {
    /// When false, admin routes skip timestamp/hash authentication
    #[serde(default = "default_auth_enabled")]
    pub auth_enabled: bool,

    /// Maximum request timestamp age accepted by admin authentication
    #[serde(default = "default_auth_max_age_ms")]
    pub auth_max_age_ms: i64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            auth_enabled: default_auth_enabled(),
            auth_max_age_ms: default_auth_max_age_ms(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_frontend_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_text_type() -> String {
    "paper".to_string()
}

fn default_sample_count() -> usize {
    3
}

fn default_provider_timeout_ms() -> u64 {
    30_000
}

fn default_simulated_latency() -> bool {
    true
}

fn default_plagiarism_corpus_limit() -> i64 {
    200
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_openai_timeout_secs() -> u64 {
    30
}

fn default_openai_connect_timeout_secs() -> u64 {
    5
}

fn default_openai_max_retries() -> u32 {
    3
}

fn default_grammar_language() -> String {
    "ko-KR".to_string()
}

fn default_auth_enabled() -> bool {
    true
}

fn default_auth_max_age_ms() -> i64 {
    30_000
}

/// Resolve which config file to read, if any
///
/// Priority: CLI argument → `AIWD_CONFIG` → `<config_dir>/aiwd/config.toml`
/// (only when it exists).
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("aiwd").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load TOML config, degrading to defaults when the file is missing
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the SQLite database path
///
/// Priority: CLI argument → `AIWD_DATABASE` → TOML `database_path` →
/// OS data directory.
pub fn resolve_database_path(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.database_path {
        return path.clone();
    }

    default_data_dir().join("aiwd.db")
}

/// OS-dependent default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("aiwd"))
        .unwrap_or_else(|| PathBuf::from("./aiwd_data"))
}

/// Validate an API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
