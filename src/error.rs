use thiserror::Error;

use crate::debate::DebatePhase;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `roundtable`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; config loading and the binary continue
/// to use `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum RoundtableError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Request validation ──────────────────────────────────────────────
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    // ── LLM / Provider ──────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Debate state machine ────────────────────────────────────────────
    #[error("debate: {0}")]
    Debate(#[from] DebateError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RoundtableError {
    /// Returns `true` when the underlying cause is a cancelled invocation.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Llm(LlmError::Cancelled) | Self::Debate(DebateError::Cancelled)
        )
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("model pool is empty and no default model is usable for role {role}")]
    NoUsableModel { role: String },

    #[error("model pool is empty")]
    EmptyPool,

    #[error("unknown role in config: {0}")]
    UnknownRole(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Validation errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("model {0} is not in the configured pool and is not a vendor/model identifier")]
    DisallowedModel(String),

    #[error("{0} must not be empty")]
    MissingText(&'static str),
}

// ─── LLM / Provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("no choices returned by model {model}")]
    EmptyResponse { model: String },

    #[error("API key not set. Add `api_key` to config.toml or set OPENROUTER_API_KEY")]
    MissingApiKey,

    #[error("model {model} did not respond within {secs}s")]
    Timeout { model: String, secs: u64 },

    #[error("invocation cancelled")]
    Cancelled,

    #[error("all models rate-limited; attempted: {}", attempted.join(", "))]
    FallbackExhausted { attempted: Vec<String> },
}

impl LlmError {
    /// HTTP status carried by an upstream failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Rate limiting is the only failure class that triggers pool fallback.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

// ─── Debate errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DebateError {
    #[error("cannot {action} while debate is {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: DebatePhase,
    },

    #[error("addendum is locked once round 2 has started")]
    AddendumLocked,

    #[error("round cancelled")]
    Cancelled,
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, RoundtableError>;
