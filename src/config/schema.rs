use crate::error::ConfigError;
use crate::llm::openrouter::OPENROUTER_BASE_URL;
use crate::roles::{Role, matches_model_pattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub tokens: TokensConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub attribution: AttributionConfig,
}

fn default_base_url() -> String {
    OPENROUTER_BASE_URL.into()
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            api_key: None,
            base_url: default_base_url(),
            default_temperature: default_temperature(),
            models: ModelsConfig::default(),
            tokens: TokensConfig::default(),
            reliability: ReliabilityConfig::default(),
            attribution: AttributionConfig::default(),
        }
    }
}

/// Candidate pool and per-role default models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Ordered fallback pool.
    #[serde(default = "default_model_pool")]
    pub pool: Vec<String>,
    /// Appended to `pool` (duplicates dropped).
    #[serde(default)]
    pub pool_extra: Vec<String>,
    /// Role name (`debater_a`, ...) to model identifier.
    #[serde(default)]
    pub roles: BTreeMap<String, String>,
}

fn default_model_pool() -> Vec<String> {
    [
        "openai/gpt-4o-mini",
        "anthropic/claude-3.5-haiku",
        "google/gemini-2.0-flash-001",
        "deepseek/deepseek-chat",
        "meta-llama/llama-3.3-70b-instruct",
        "mistralai/mistral-small-3.1-24b-instruct",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            pool: default_model_pool(),
            pool_extra: Vec::new(),
            roles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensConfig {
    /// Global completion-token cap; no role may exceed it.
    #[serde(default = "default_max_tokens_cap")]
    pub cap: u32,
    /// Role name to completion-token budget.
    #[serde(default)]
    pub roles: BTreeMap<String, u32>,
}

fn default_max_tokens_cap() -> u32 {
    4_096
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            cap: default_max_tokens_cap(),
            roles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Fixed delay before each fallback attempt.
    #[serde(default = "default_fallback_delay_ms")]
    pub fallback_delay_ms: u64,
    /// Per-call deadline.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_fallback_delay_ms() -> u64 {
    1_200
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            fallback_delay_ms: default_fallback_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Optional `HTTP-Referer` / `X-Title` headers sent with every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default = "default_attribution_title")]
    pub title: Option<String>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_attribution_title() -> Option<String> {
    Some("roundtable".into())
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            referer: None,
            title: default_attribution_title(),
        }
    }
}

fn parse_role_key(key: &str) -> Result<Role, ConfigError> {
    Role::parse(key).map_err(|_| ConfigError::UnknownRole(key.to_string()))
}

impl Config {
    /// `models.pool` followed by `models.pool_extra`, trimmed, empties and
    /// duplicates removed, order preserved.
    pub fn effective_pool(&self) -> Vec<String> {
        let mut pool: Vec<String> = Vec::new();
        for model in self.models.pool.iter().chain(&self.models.pool_extra) {
            let model = model.trim();
            if !model.is_empty() && !pool.iter().any(|m| m == model) {
                pool.push(model.to_string());
            }
        }
        pool
    }

    pub fn role_model_defaults(&self) -> Result<BTreeMap<Role, String>, ConfigError> {
        self.models
            .roles
            .iter()
            .map(|(key, model)| Ok((parse_role_key(key)?, model.trim().to_string())))
            .collect()
    }

    pub fn role_token_overrides(&self) -> Result<BTreeMap<Role, u32>, ConfigError> {
        self.tokens
            .roles
            .iter()
            .map(|(key, budget)| Ok((parse_role_key(key)?, *budget)))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let pool = self.effective_pool();
        if pool.is_empty() {
            return Err(ConfigError::EmptyPool);
        }
        if let Some(bad) = pool.iter().find(|m| !matches_model_pattern(m)) {
            return Err(ConfigError::Validation(format!(
                "pool entry {bad:?} is not a vendor/model identifier"
            )));
        }
        if self.tokens.cap == 0 {
            return Err(ConfigError::Validation(
                "tokens.cap must be greater than zero".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::Validation(format!(
                "default_temperature {} is outside 0.0..=2.0",
                self.default_temperature
            )));
        }
        for (role, model) in self.role_model_defaults()? {
            if !matches_model_pattern(&model) {
                return Err(ConfigError::Validation(format!(
                    "models.roles.{role} = {model:?} is not a vendor/model identifier"
                )));
            }
        }
        self.role_token_overrides()?;
        Ok(())
    }
}
