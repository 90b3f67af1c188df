use super::Config;
use crate::roles::Role;

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) =
            non_empty_var("ROUNDTABLE_API_KEY").or_else(|| non_empty_var("OPENROUTER_API_KEY"))
        {
            self.api_key = Some(key);
        }

        if let Some(url) = non_empty_var("ROUNDTABLE_BASE_URL") {
            self.base_url = url;
        }

        if let Some(pool) = non_empty_var("ROUNDTABLE_MODEL_POOL") {
            self.models.pool = split_model_list(&pool);
        }

        if let Some(extra) = non_empty_var("ROUNDTABLE_MODEL_POOL_EXTRA") {
            self.models.pool_extra = split_model_list(&extra);
        }

        if let Some(cap) = non_empty_var("ROUNDTABLE_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.tokens.cap = cap;
        }

        if let Some(temp) =
            non_empty_var("ROUNDTABLE_TEMPERATURE").and_then(|v| v.parse::<f64>().ok())
            && (0.0..=2.0).contains(&temp)
        {
            self.default_temperature = temp;
        }

        for role in Role::ALL {
            let suffix = role.env_suffix();
            if let Some(model) = non_empty_var(&format!("ROUNDTABLE_MODEL_{suffix}")) {
                self.models.roles.insert(role.to_string(), model);
            }
            if let Some(budget) = non_empty_var(&format!("ROUNDTABLE_MAX_TOKENS_{suffix}"))
                .and_then(|v| v.parse::<u32>().ok())
            {
                self.tokens.roles.insert(role.to_string(), budget);
            }
        }
    }
}
