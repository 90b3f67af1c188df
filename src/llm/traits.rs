use super::types::{ChatCompletion, ChatRequest};
use crate::error::LlmError;
use std::future::Future;
use std::pin::Pin;

/// A backend that can answer one chat completion request.
///
/// Implementations translate [`ChatRequest`] into their wire format and
/// normalize both success and failure. A non-success HTTP response must come
/// back as [`LlmError::Upstream`] so the invoker can classify rate limiting.
pub trait ChatProvider: Send + Sync {
    /// Provider identifier (e.g. "openrouter").
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatCompletion, LlmError>> + Send + 'a>>;

    /// Warm up the HTTP connection pool.
    fn warmup(&self) -> Pin<Box<dyn Future<Output = Result<(), LlmError>> + Send + '_>> {
        Box::pin(async move { Ok(()) })
    }
}
