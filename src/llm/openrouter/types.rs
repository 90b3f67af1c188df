use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(in crate::llm) struct ChatRequest<'a> {
    pub(in crate::llm) model: &'a str,
    pub(in crate::llm) messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(in crate::llm) temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(in crate::llm) max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(in crate::llm) struct Message<'a> {
    pub(in crate::llm) role: &'static str,
    pub(in crate::llm) content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(in crate::llm) struct ChatResponse {
    #[serde(default)]
    pub(in crate::llm) model: Option<String>,
    #[serde(default)]
    pub(in crate::llm) choices: Vec<Choice>,
    #[serde(default)]
    pub(in crate::llm) usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(in crate::llm) struct Usage {
    #[serde(default)]
    pub(in crate::llm) prompt_tokens: u64,
    #[serde(default)]
    pub(in crate::llm) completion_tokens: u64,
    #[serde(default)]
    pub(in crate::llm) total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(in crate::llm) struct Choice {
    pub(in crate::llm) message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(in crate::llm) struct ResponseMessage {
    #[serde(default)]
    pub(in crate::llm) content: Option<MessageContent>,
}

/// `content` is either a plain string or a list of typed parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(in crate::llm) enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
pub(in crate::llm) struct ContentPart {
    #[serde(rename = "type", default)]
    pub(in crate::llm) kind: Option<String>,
    #[serde(default)]
    pub(in crate::llm) text: Option<String>,
}

impl MessageContent {
    pub(in crate::llm) fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Parts(parts) => parts
                .into_iter()
                .filter(|part| part.kind.as_deref().is_none_or(|kind| kind == "text"))
                .filter_map(|part| part.text)
                .collect(),
        }
    }
}
