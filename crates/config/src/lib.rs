//! Configuration loading, validation, and management for RelayDesk.
//!
//! Loads configuration from `~/.relaydesk/config.toml` with `.env` and
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.relaydesk/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider name, used in logs
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per response (unset = provider default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Per-call timeout for completion requests
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Study planner settings
    #[serde(default)]
    pub study: StudyConfig,

    /// Travel planner settings
    #[serde(default)]
    pub travel: TravelConfig,

    /// Customer support knowledge base
    #[serde(default)]
    pub support: SupportConfig,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout() -> u64 {
    120
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("gateway", &self.gateway)
            .field("study", &self.study)
            .field("travel", &self.travel)
            .field("support", &self.support)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Request body limit; uploads travel inside JSON bodies
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Cap on live travel sessions before the oldest is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_port() -> u16 {
    8501
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_max_sessions() -> usize {
    1_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_bytes: default_max_body_bytes(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    /// How much of the extracted notes the research stage sees
    #[serde(default = "default_research_excerpt_chars")]
    pub research_excerpt_chars: usize,
}

fn default_research_excerpt_chars() -> usize {
    200
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            research_excerpt_chars: default_research_excerpt_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelConfig {
    #[serde(default = "default_max_duration_days")]
    pub max_duration_days: u32,

    #[serde(default = "default_max_group_size")]
    pub max_group_size: u32,

    #[serde(default = "default_min_budget_usd")]
    pub min_budget_usd: f64,
}

fn default_max_duration_days() -> u32 {
    30
}
fn default_max_group_size() -> u32 {
    10
}
fn default_min_budget_usd() -> f64 {
    100.0
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            max_duration_days: default_max_duration_days(),
            max_group_size: default_max_group_size(),
            min_budget_usd: default_min_budget_usd(),
        }
    }
}

/// One canned question/answer pair. Order matters: the first matching
/// question wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    fn new(question: &str, answer: &str) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    #[serde(default = "default_faq")]
    pub faq: Vec<FaqEntry>,

    #[serde(default = "default_faq_fallback")]
    pub faq_fallback: String,

    #[serde(default = "default_return_policy")]
    pub return_policy: Vec<FaqEntry>,

    #[serde(default = "default_return_policy_fallback")]
    pub return_policy_fallback: String,
}

fn default_faq() -> Vec<FaqEntry> {
    vec![
        FaqEntry::new(
            "iphone availability",
            "Haan, iPhone currently stock mein available hai.",
        ),
        FaqEntry::new(
            "delivery time for iphone",
            "Delivery usually 3-5 business days lagti hai.",
        ),
        FaqEntry::new(
            "payment method",
            "Aap Cash on Delivery, Credit Card, aur EasyPaisa use kar sakte hain.",
        ),
    ]
}
fn default_faq_fallback() -> String {
    "Maaf kijiye, mujhe is sawal ka jawab nahi mila FAQ mein.".into()
}
fn default_return_policy() -> Vec<FaqEntry> {
    vec![
        FaqEntry::new(
            "return policy",
            "Product delivery ke 7 din ke andar return kiya ja sakta hai agar seal nahi tooti ho.",
        ),
        FaqEntry::new("refund time", "Refund 5-7 working days mein process hota hai."),
        FaqEntry::new("exchange possible", "Haan, exchange possible hai within 7 days."),
    ]
}
fn default_return_policy_fallback() -> String {
    "Return policy mein yeh specific information nahi mili.".into()
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            faq: default_faq(),
            faq_fallback: default_faq_fallback(),
            return_policy: default_return_policy(),
            return_policy_fallback: default_return_policy_fallback(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.relaydesk/config.toml).
    ///
    /// A `.env` file in the working directory is loaded first, then these
    /// environment variables are consulted:
    /// - `RELAYDESK_API_KEY` (highest priority), `API_KEY`, `GEMINI_API_KEY`,
    ///   `OPENAI_API_KEY`: only when the file sets no key
    /// - `RELAYDESK_MODEL`, `RELAYDESK_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            self.api_key = non_empty("RELAYDESK_API_KEY")
                .or_else(|| non_empty("API_KEY"))
                .or_else(|| non_empty("GEMINI_API_KEY"))
                .or_else(|| non_empty("OPENAI_API_KEY"));
        }

        if let Some(model) = non_empty("RELAYDESK_MODEL") {
            self.default_model = model;
        }

        if let Some(url) = non_empty("RELAYDESK_API_URL") {
            self.api_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".relaydesk")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if self.travel.max_duration_days == 0 || self.travel.max_group_size < 2 {
            return Err(ConfigError::ValidationError(
                "travel.max_duration_days must be > 0 and travel.max_group_size >= 2".into(),
            ));
        }

        if self
            .support
            .faq
            .iter()
            .chain(&self.support.return_policy)
            .any(|e| e.question.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "support entries need a non-empty question".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            api_url: default_api_url(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            request_timeout_secs: default_request_timeout(),
            gateway: GatewayConfig::default(),
            study: StudyConfig::default(),
            travel: TravelConfig::default(),
            support: SupportConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
