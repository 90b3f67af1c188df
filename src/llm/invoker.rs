use super::traits::ChatProvider;
use super::types::{ChatCompletion, ChatMessage, ChatRequest, Invocation, fold_system_into_user};
use crate::config::Config;
use crate::error::LlmError;
use crate::roles::supports_system_role;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_FALLBACK_DELAY_MS: u64 = 1_200;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;

/// Issues chat completions through a [`ChatProvider`], walking the model
/// pool when the backend rate-limits.
///
/// Retries are strictly sequential with a fixed delay between attempts; only
/// a rate-limit failure ever moves on to the next model.
pub struct Invoker {
    provider: Arc<dyn ChatProvider>,
    pool: Vec<String>,
    fallback_delay: Duration,
    call_timeout: Duration,
}

impl Invoker {
    pub fn new(provider: Arc<dyn ChatProvider>, pool: Vec<String>) -> Self {
        Self {
            provider,
            pool,
            fallback_delay: Duration::from_millis(DEFAULT_FALLBACK_DELAY_MS),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    pub fn from_config(provider: Arc<dyn ChatProvider>, config: &Config) -> Self {
        Self::new(provider, config.effective_pool())
            .with_fallback_delay(Duration::from_millis(config.reliability.fallback_delay_ms))
            .with_call_timeout(Duration::from_secs(
                config.reliability.request_timeout_secs.max(1),
            ))
    }

    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub async fn warmup(&self) -> Result<(), LlmError> {
        self.provider.warmup().await
    }

    /// One call against `model`, bounded by the per-call deadline.
    pub async fn invoke(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: Option<f64>,
        max_tokens: u32,
    ) -> Result<ChatCompletion, LlmError> {
        let messages = if supports_system_role(model) {
            messages.to_vec()
        } else {
            tracing::debug!(model, "Folding system prompt into user message");
            fold_system_into_user(messages)
        };

        let request = ChatRequest {
            model: model.to_string(),
            messages,
            temperature,
            max_tokens: Some(max_tokens),
        };

        match tokio::time::timeout(self.call_timeout, self.provider.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                model: model.to_string(),
                secs: self.call_timeout.as_secs(),
            }),
        }
    }

    async fn invoke_cancellable(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: Option<f64>,
        max_tokens: u32,
        cancel: &CancellationToken,
    ) -> Result<ChatCompletion, LlmError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(LlmError::Cancelled),
            result = self.invoke(model, messages, temperature, max_tokens) => result,
        }
    }

    /// Invoke `model`, falling back across the pool on rate limiting.
    ///
    /// Non-rate-limit failures, and any failure when `allow_fallback` is
    /// false, propagate immediately. When every candidate is rate-limited the
    /// error names every attempted model.
    pub async fn invoke_with_fallback(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: Option<f64>,
        max_tokens: u32,
        allow_fallback: bool,
        cancel: &CancellationToken,
    ) -> Result<Invocation, LlmError> {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        let mut attempted = vec![model.to_string()];
        let primary_error = match self
            .invoke_cancellable(model, messages, temperature, max_tokens, cancel)
            .await
        {
            Ok(completion) => return Ok(Invocation::from_completion(completion, attempted)),
            Err(error) => error,
        };

        if !primary_error.is_rate_limited() || !allow_fallback {
            return Err(primary_error);
        }

        tracing::warn!(
            provider = self.provider.name(),
            model,
            "Model rate-limited, falling back across pool"
        );

        for candidate in &self.pool {
            if attempted.iter().any(|m| m == candidate) {
                continue;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(LlmError::Cancelled),
                () = tokio::time::sleep(self.fallback_delay) => {}
            }

            attempted.push(candidate.clone());
            match self
                .invoke_cancellable(candidate, messages, temperature, max_tokens, cancel)
                .await
            {
                Ok(completion) => {
                    tracing::info!(
                        model = candidate.as_str(),
                        attempts = attempted.len(),
                        "Fallback model answered"
                    );
                    return Ok(Invocation::from_completion(completion, attempted));
                }
                Err(error) if error.is_rate_limited() => {
                    tracing::warn!(
                        model = candidate.as_str(),
                        attempt = attempted.len(),
                        "Fallback model rate-limited, trying next"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        Err(LlmError::FallbackExhausted { attempted })
    }
}
