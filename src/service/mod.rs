//! The single entry point through which every pipeline stage reaches a model.

use crate::config::Config;
use crate::error::{ConfigError, Result, ValidationError};
use crate::llm::{ChatMessage, ChatProvider, Invocation, Invoker};
use crate::roles::{ModelResolver, Role, TokenPolicy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;


/// One role invocation as received at the service boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRoleRequest {
    pub role: Role,
    pub user_prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub role_models: Option<BTreeMap<Role, String>>,
    /// Defaults to `true` only when no explicit model was requested.
    #[serde(default)]
    pub allow_fallback: Option<bool>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl RunRoleRequest {
    pub fn new(role: Role, user_prompt: impl Into<String>) -> Self {
        Self {
            role,
            user_prompt: user_prompt.into(),
            model: None,
            role_models: None,
            allow_fallback: None,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_role_models(mut self, role_models: BTreeMap<Role, String>) -> Self {
        self.role_models = Some(role_models);
        self
    }

    pub fn with_allow_fallback(mut self, allow: bool) -> Self {
        self.allow_fallback = Some(allow);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn explicit_model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Resolves model and budget for a role, then invokes it with fallback.
pub struct RoleService {
    resolver: ModelResolver,
    tokens: TokenPolicy,
    invoker: Invoker,
    default_temperature: f64,
}

impl RoleService {
    pub fn new(
        resolver: ModelResolver,
        tokens: TokenPolicy,
        invoker: Invoker,
        default_temperature: f64,
    ) -> Self {
        Self {
            resolver,
            tokens,
            invoker,
            default_temperature,
        }
    }

    pub fn from_config(
        config: &Config,
        provider: Arc<dyn ChatProvider>,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(
            ModelResolver::from_config(config)?,
            TokenPolicy::from_config(config)?,
            Invoker::from_config(provider, config),
            config.default_temperature,
        ))
    }

    pub fn resolver(&self) -> &ModelResolver {
        &self.resolver
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub async fn run_role(&self, request: RunRoleRequest) -> Result<Invocation> {
        self.run_role_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Validate, resolve and invoke `request`, abandoning it once `cancel` fires.
    pub async fn run_role_with_cancel(
        &self,
        request: RunRoleRequest,
        cancel: &CancellationToken,
    ) -> Result<Invocation> {
        if request.user_prompt.trim().is_empty() {
            return Err(ValidationError::MissingText("user prompt").into());
        }
        let explicit = request.explicit_model();
        if let Some(model) = explicit
            && !self.resolver.is_allowed(model)
        {
            return Err(ValidationError::DisallowedModel(model.to_string()).into());
        }

        let role = request.role;
        let model = self
            .resolver
            .resolve(role, explicit, request.role_models.as_ref())?;
        let max_tokens = self.tokens.effective_max_tokens(role, request.max_tokens);
        let allow_fallback = request.allow_fallback.unwrap_or(explicit.is_none());
        let temperature = request.temperature.unwrap_or(self.default_temperature);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request
            .system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(request.user_prompt));

        tracing::debug!(%role, model, max_tokens, allow_fallback, "Invoking role");
        let invocation = self
            .invoker
            .invoke_with_fallback(
                &model,
                &messages,
                Some(temperature),
                max_tokens,
                allow_fallback,
                cancel,
            )
            .await?;
        tracing::info!(
            %role,
            model = invocation.model_used.as_str(),
            attempts = invocation.attempted.len(),
            total_tokens = invocation.usage.total_tokens,
            "Role completed"
        );
        Ok(invocation)
    }
}
