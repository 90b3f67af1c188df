use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Fold every system message into the first user message.
///
/// Used for backends that reject or silently drop the system role. System
/// text is prepended to the user body, separated by a blank line; when no user
/// message exists the system text becomes one.
pub fn fold_system_into_user(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let system_text: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str())
        .filter(|text| !text.trim().is_empty())
        .collect();

    let mut folded: Vec<ChatMessage> = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .cloned()
        .collect();

    if system_text.is_empty() {
        return folded;
    }

    let preamble = system_text.join("\n\n");
    match folded.iter_mut().find(|m| m.role == MessageRole::User) {
        Some(first_user) => {
            first_user.content = format!("{preamble}\n\n{}", first_user.content);
        }
        None => folded.insert(0, ChatMessage::user(preamble)),
    }
    folded
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    pub fn accumulate(&mut self, other: &Usage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// Role-agnostic chat completion request handed to a [`ChatProvider`](super::ChatProvider).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Normalized success response from a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub content: String,
    /// Model reported by the backend, or the requested model when absent.
    pub model: String,
    pub usage: Usage,
}

/// Result of an invocation that may have walked the fallback pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub content: String,
    pub model_used: String,
    /// Every model tried, in order, ending with the one that answered.
    pub attempted: Vec<String>,
    pub usage: Usage,
}

impl Invocation {
    pub fn from_completion(completion: ChatCompletion, attempted: Vec<String>) -> Self {
        Self {
            content: completion.content,
            model_used: completion.model,
            attempted,
            usage: completion.usage,
        }
    }
}
