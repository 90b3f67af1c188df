use super::Role;
use crate::config::Config;
use crate::error::ConfigError;
use std::collections::BTreeMap;

/// Per-role completion budgets bounded by a global cap.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    cap: u32,
    per_role: BTreeMap<Role, u32>,
}

impl TokenPolicy {
    pub fn new(cap: u32, per_role: BTreeMap<Role, u32>) -> Self {
        Self {
            cap: cap.max(1),
            per_role,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.tokens.cap, config.role_token_overrides()?))
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// `min(override ?? configured per-role ?? role default, cap)`, never below 1.
    pub fn effective_max_tokens(&self, role: Role, override_tokens: Option<u32>) -> u32 {
        override_tokens
            .or_else(|| self.per_role.get(&role).copied())
            .unwrap_or_else(|| role.default_max_tokens())
            .min(self.cap)
            .max(1)
    }
}
