#![allow(dead_code)]

use roundtable::llm::{
    ChatCompletion, ChatProvider, ChatRequest, Invoker, MessageRole, Usage,
};
use roundtable::roles::{ModelResolver, Role, TokenPolicy};
use roundtable::RoleService;
use roundtable::error::LlmError;
use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const POOL: [&str; 3] = ["m/m", "n/n", "o/o"];

pub enum Reply {
    Text(String),
    Status(u16),
    Failure(u16, &'static str),
    /// Cancel the token, then never answer.
    Interrupt(CancellationToken),
}

pub fn text(content: impl Into<String>) -> Reply {
    Reply::Text(content.into())
}

/// Serves replies in call order and records every request it sees.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from(replies)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn models(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }

    /// Last user message of every request, in call order.
    pub fn user_prompts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| {
                r.messages
                    .iter()
                    .rev()
                    .find(|m| m.role == MessageRole::User)
                    .map(|m| m.content.clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatCompletion, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            match reply {
                Some(Reply::Text(content)) => Ok(ChatCompletion {
                    content,
                    model: request.model.clone(),
                    usage: Usage::new(10, 5),
                }),
                Some(Reply::Status(status)) => Err(LlmError::Upstream {
                    status,
                    body: format!("scripted {status}"),
                }),
                Some(Reply::Failure(status, body)) => Err(LlmError::Upstream {
                    status,
                    body: body.to_string(),
                }),
                Some(Reply::Interrupt(token)) => {
                    token.cancel();
                    std::future::pending().await
                }
                None => Err(LlmError::Upstream {
                    status: 500,
                    body: "script exhausted".into(),
                }),
            }
        })
    }
}

pub fn service_with(
    provider: Arc<ScriptedProvider>,
    cap: u32,
    per_role: BTreeMap<Role, u32>,
) -> Arc<RoleService> {
    let pool: Vec<String> = POOL.iter().map(|m| (*m).to_string()).collect();
    Arc::new(RoleService::new(
        ModelResolver::new(pool.clone(), BTreeMap::new()),
        TokenPolicy::new(cap, per_role),
        Invoker::new(provider, pool).with_fallback_delay(Duration::ZERO),
        0.7,
    ))
}

pub fn service(provider: Arc<ScriptedProvider>) -> Arc<RoleService> {
    service_with(provider, 4096, BTreeMap::new())
}

/// A well-formed debater reply with one perspective and one counterpoint.
pub fn debater_json(speaker: &str, perspective: &str, counterpoint: &str) -> String {
    serde_json::json!({
        "speaker": speaker,
        "new_perspectives": [{"id": "p1", "contents": perspective}],
        "counterpoints": [{"id": "c1", "contents": counterpoint}],
    })
    .to_string()
}
