use super::traits::ChatProvider;
use super::types::{ChatCompletion, ChatRequest, Usage};
use crate::error::LlmError;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub(crate) enum Reply {
    Text(String),
    Status(u16),
    /// Never answers.
    Hang,
}

enum Script {
    /// Replies served in call order.
    Queue(Mutex<VecDeque<Reply>>),
    /// Fixed reply per model; unlisted models answer `answer from <model>`.
    PerModel(HashMap<String, Reply>),
}

/// Fake provider for unit tests that records every request it sees.
pub(crate) struct QueueProvider {
    script: Script,
    requests: Mutex<Vec<ChatRequest>>,
}

impl QueueProvider {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Self::with_script(Script::Queue(Mutex::new(replies.into_iter().collect())))
    }

    pub(crate) fn texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Arc<Self> {
        Self::new(texts.into_iter().map(|t| Reply::Text(t.into())))
    }

    pub(crate) fn per_model(behaviour: &[(&str, Reply)]) -> Arc<Self> {
        Self::with_script(Script::PerModel(
            behaviour
                .iter()
                .map(|(model, reply)| ((*model).to_string(), reply.clone()))
                .collect(),
        ))
    }

    fn with_script(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn called_models(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }

    fn next_reply(&self, model: &str) -> Option<Reply> {
        match &self.script {
            Script::Queue(replies) => replies
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front(),
            Script::PerModel(behaviour) => Some(
                behaviour
                    .get(model)
                    .cloned()
                    .unwrap_or_else(|| Reply::Text(format!("answer from {model}"))),
            ),
        }
    }
}

impl ChatProvider for QueueProvider {
    fn name(&self) -> &str {
        "queue"
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
            match self.next_reply(&request.model) {
                Some(Reply::Text(content)) => Ok(ChatCompletion {
                    content,
                    model: request.model.clone(),
                    usage: Usage::new(10, 5),
                }),
                Some(Reply::Status(status)) => Err(LlmError::Upstream {
                    status,
                    body: format!("scripted status {status}"),
                }),
                Some(Reply::Hang) => std::future::pending().await,
                None => Err(LlmError::Upstream {
                    status: 500,
                    body: "script exhausted".into(),
                }),
            }
        })
    }
}
