// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod scrub;
pub mod traits;
pub mod types;

// ── Invocation layer ────────────────────────────────────────────────────────
pub mod invoker;

// ── Provider implementations ────────────────────────────────────────────────
pub mod openrouter;

#[cfg(test)]
pub(crate) mod test_provider;

// ── Re-exports ──────────────────────────────────────────────────────────────
pub use invoker::Invoker;
pub use openrouter::OpenRouterProvider;
pub use scrub::{sanitize_upstream_body, scrub_secret_patterns};
pub use traits::ChatProvider;
pub use types::{
    ChatCompletion, ChatMessage, ChatRequest, Invocation, MessageRole, Usage,
    fold_system_into_user,
};
