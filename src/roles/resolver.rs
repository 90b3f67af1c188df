use super::Role;
use crate::config::Config;
use crate::error::ConfigError;
use std::collections::BTreeMap;

fn is_vendor_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn is_model_char(c: char) -> bool {
    is_vendor_char(c) || c == ':'
}

/// `vendor/model-name` syntax check for identifiers not listed in the pool.
///
/// Exactly one `/` with non-empty halves. The model half may carry a `:tag`
/// variant suffix (e.g. `meta-llama/llama-3.3-70b-instruct:free`).
pub fn matches_model_pattern(model: &str) -> bool {
    let Some((vendor, name)) = model.split_once('/') else {
        return false;
    };
    !vendor.is_empty()
        && !name.is_empty()
        && vendor.chars().all(is_vendor_char)
        && name.chars().all(is_model_char)
        && !name.starts_with(':')
        && !name.ends_with(':')
}

/// Model families that reject or ignore a separate system message.
const NO_SYSTEM_ROLE_PREFIXES: [&str; 4] = [
    "google/gemma",
    "mistralai/mistral-7b-instruct",
    "openai/o1-mini",
    "openai/o1-preview",
];

/// Whether `model` accepts a dedicated system message.
///
/// When this returns `false` the system instruction must be folded into the
/// user message body instead.
pub fn supports_system_role(model: &str) -> bool {
    let model = model.to_ascii_lowercase();
    if model.contains("gemma") {
        return false;
    }
    !NO_SYSTEM_ROLE_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Chooses the model that serves a role.
#[derive(Debug, Clone)]
pub struct ModelResolver {
    pool: Vec<String>,
    defaults: BTreeMap<Role, String>,
}

impl ModelResolver {
    /// `defaults` overlays the static per-role defaults; roles missing from
    /// it keep [`Role::default_model`].
    pub fn new(pool: Vec<String>, defaults: BTreeMap<Role, String>) -> Self {
        let defaults = Role::ALL
            .into_iter()
            .map(|role| {
                let model = defaults
                    .get(&role)
                    .cloned()
                    .unwrap_or_else(|| role.default_model().to_string());
                (role, model)
            })
            .collect();
        Self { pool, defaults }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.effective_pool(),
            config.role_model_defaults()?,
        ))
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn default_for(&self, role: Role) -> &str {
        self.defaults
            .get(&role)
            .map_or_else(|| role.default_model(), String::as_str)
    }

    /// Pool member, or a syntactically valid `vendor/model` identifier.
    pub fn is_allowed(&self, model: &str) -> bool {
        self.pool.iter().any(|m| m == model) || matches_model_pattern(model)
    }

    /// Resolve the model for `role`.
    ///
    /// Precedence: explicit model > caller role map > per-role default >
    /// first pool entry. Candidates that are not allowed are skipped.
    pub fn resolve(
        &self,
        role: Role,
        explicit: Option<&str>,
        role_models: Option<&BTreeMap<Role, String>>,
    ) -> Result<String, ConfigError> {
        let from_map = role_models.and_then(|map| map.get(&role)).map(String::as_str);
        let candidates = [explicit, from_map, Some(self.default_for(role))];

        if let Some(model) = candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty() && self.is_allowed(m))
        {
            return Ok(model.to_string());
        }

        self.pool
            .first()
            .cloned()
            .ok_or_else(|| ConfigError::NoUsableModel {
                role: role.to_string(),
            })
    }
}
