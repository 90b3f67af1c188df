mod types;

use self::types::{ChatRequest as WireRequest, ChatResponse, Message};
use crate::config::Config;
use crate::error::LlmError;
use crate::llm::{
    scrub::upstream_error,
    traits::ChatProvider,
    types::{ChatCompletion, ChatRequest, Usage},
};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Adapter for OpenAI-compatible `/chat/completions` endpoints (OpenRouter by default).
pub struct OpenRouterProvider {
    base_url: String,
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    extra_headers: Vec<(&'static str, String)>,
    client: Client,
}

fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

impl OpenRouterProvider {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            cached_auth_header: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            extra_headers: Vec::new(),
            client: build_client(120),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut provider = Self::new(config.api_key.as_deref())
            .with_base_url(&config.base_url)
            .with_attribution(
                config.attribution.referer.as_deref(),
                config.attribution.title.as_deref(),
            );
        // Transport timeout sits just above the invoker deadline so the
        // invoker reports the timeout, not reqwest.
        provider.client = build_client(config.reliability.request_timeout_secs + 5);
        provider
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Attach the optional `HTTP-Referer` / `X-Title` attribution headers.
    pub fn with_attribution(mut self, referer: Option<&str>, title: Option<&str>) -> Self {
        self.extra_headers.clear();
        if let Some(referer) = referer.filter(|r| !r.is_empty()) {
            self.extra_headers.push(("HTTP-Referer", referer.to_string()));
        }
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            self.extra_headers.push(("X-Title", title.to_string()));
        }
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(request: &ChatRequest) -> WireRequest<'_> {
        WireRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| Message {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn extract_completion(
        chat_response: ChatResponse,
        requested_model: &str,
    ) -> Result<ChatCompletion, LlmError> {
        let model = chat_response
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| requested_model.to_string());

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyResponse {
                model: model.clone(),
            })?;

        let content = choice
            .message
            .content
            .map(types::MessageContent::into_text)
            .unwrap_or_default();

        let usage = chat_response.usage.map_or_else(Usage::default, |u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u
                .total_tokens
                .unwrap_or_else(|| u.prompt_tokens.saturating_add(u.completion_tokens)),
        });

        Ok(ChatCompletion {
            content,
            model,
            usage,
        })
    }

    async fn call_api(&self, request: &ChatRequest) -> Result<ChatCompletion, LlmError> {
        let auth_header = self
            .cached_auth_header
            .as_ref()
            .ok_or(LlmError::MissingApiKey)?;

        let mut request_builder = self
            .client
            .post(self.chat_completions_url())
            .header("Authorization", auth_header)
            .json(&Self::build_request(request));

        for (name, value) in &self.extra_headers {
            request_builder = request_builder.header(*name, value);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|error| LlmError::Request(error.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|error| LlmError::Decode(error.without_url().to_string()))?;

        Self::extract_completion(chat_response, &request.model)
    }
}

impl ChatProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatCompletion, LlmError>> + Send + 'a>> {
        Box::pin(async move { self.call_api(request).await })
    }

    fn warmup(&self) -> Pin<Box<dyn Future<Output = Result<(), LlmError>> + Send + '_>> {
        Box::pin(async move {
            // Establish the TLS connection pool before the first real call.
            if let Some(auth_header) = self.cached_auth_header.as_ref() {
                let response = self
                    .client
                    .get(format!("{}/auth/key", self.base_url))
                    .header("Authorization", auth_header)
                    .send()
                    .await
                    .map_err(|error| LlmError::Request(error.without_url().to_string()))?;
                if !response.status().is_success() {
                    return Err(upstream_error(response).await);
                }
            }
            Ok(())
        })
    }
}
