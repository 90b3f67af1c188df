use super::prompts::{
    REFINER_SYSTEM_PROMPT, SUMMARIZER_SYSTEM_PROMPT, participant_prompt,
    participant_system_prompt, refiner_prompt, summary_prompt, visible_context,
    with_context_hint,
};
use super::state::{
    DebatePhase, DebateSession, Participant, ParticipantResult, Round, Summary, SummarySource,
};
use super::structured::{self, ParsedOutput};
use crate::error::{DebateError, Result, RoundtableError, ValidationError};
use crate::llm::Usage;
use crate::roles::Role;
use crate::service::{RoleService, RunRoleRequest};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Drives one [`DebateSession`] through refinement, rounds and summary.
///
/// Every mutating operation takes `&mut self`, so at most one model call is
/// outstanding per session. Rounds run under a child of the session token;
/// cancelling the session abandons the current call and every later one.
pub struct DebateOrchestrator {
    service: Arc<RoleService>,
    session: DebateSession,
    role_models: Option<BTreeMap<Role, String>>,
    cancel: CancellationToken,
}

impl DebateOrchestrator {
    /// Refine `raw_request` into the final prompt and open a session on it.
    ///
    /// An empty refiner reply falls back to the raw request.
    pub async fn start(
        service: Arc<RoleService>,
        raw_request: &str,
        role_models: Option<BTreeMap<Role, String>>,
    ) -> Result<Self> {
        Self::start_with_cancel(service, raw_request, role_models, CancellationToken::new()).await
    }

    /// Like [`start`](Self::start), with `cancel` becoming the session token.
    pub async fn start_with_cancel(
        service: Arc<RoleService>,
        raw_request: &str,
        role_models: Option<BTreeMap<Role, String>>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let raw_request = raw_request.trim();
        if raw_request.is_empty() {
            return Err(ValidationError::MissingText("request").into());
        }

        let mut request = RunRoleRequest::new(Role::Refiner, refiner_prompt(raw_request))
            .with_system_prompt(REFINER_SYSTEM_PROMPT);
        if let Some(map) = &role_models {
            request = request.with_role_models(map.clone());
        }
        let invocation = service.run_role_with_cancel(request, &cancel).await?;

        let refined = invocation.content.trim();
        let final_prompt = if refined.is_empty() {
            tracing::warn!(
                model = invocation.model_used.as_str(),
                "Refiner returned nothing, using raw request"
            );
            raw_request
        } else {
            refined
        };

        let mut session = DebateSession::new(raw_request, final_prompt);
        session.refiner_model = Some(invocation.model_used.clone());
        session.usage.accumulate(&invocation.usage);
        tracing::info!(session = %session.id, "Debate session opened");

        Ok(Self {
            service,
            session,
            role_models,
            cancel,
        })
    }

    /// Open a session on an already final prompt, skipping the refiner.
    pub fn from_final_prompt(service: Arc<RoleService>, final_prompt: &str) -> Self {
        Self::with_session(service, DebateSession::new(final_prompt, final_prompt))
    }

    pub fn with_session(service: Arc<RoleService>, session: DebateSession) -> Self {
        Self {
            service,
            session,
            role_models: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the session token, e.g. with one wired to a signal handler.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_role_models(mut self, role_models: BTreeMap<Role, String>) -> Self {
        self.role_models = Some(role_models);
        self
    }

    pub fn session(&self) -> &DebateSession {
        &self.session
    }

    pub fn into_session(self) -> DebateSession {
        self.session
    }

    pub fn phase(&self) -> DebatePhase {
        self.session.phase
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn set_addendum_draft(&mut self, text: impl Into<String>) -> Result<()> {
        if !self.session.phase.allows_addendum_edit() {
            return Err(DebateError::AddendumLocked.into());
        }
        self.session.addendum.set_draft(text);
        Ok(())
    }

    /// Run all three participants of `round` serially.
    ///
    /// Participant failures are recorded and the round continues. On
    /// cancellation the phase reverts and already recorded slots stay.
    pub async fn run_round(&mut self, round: Round) -> Result<()> {
        let previous = self.session.phase;
        let running = previous.begin_round(round)?;
        if round == Round::Two {
            let committed = self.session.addendum.commit();
            tracing::debug!(chars = committed.chars().count(), "Addendum committed");
        }
        self.session.phase = running;
        tracing::info!(session = %self.session.id, round = round.number(), "Round started");

        let token = self.cancel.child_token();
        for participant in Participant::ALL {
            if let Err(error) = self.run_participant(round, participant, &token).await {
                self.session.phase = previous;
                tracing::warn!(round = round.number(), %participant, "Round cancelled");
                return Err(error.into());
            }
        }

        self.session.phase = DebatePhase::finish_round(round);
        let succeeded = self
            .session
            .results
            .round(round)
            .iter()
            .filter(|r| r.is_success())
            .count();
        tracing::info!(round = round.number(), succeeded, "Round finished");
        Ok(())
    }

    /// Re-run one participant of a finished round. The new result supersedes
    /// the old one; the old entry stays in the log.
    pub async fn retry_participant(&mut self, round: Round, participant: Participant) -> Result<()> {
        let previous = self.session.phase;
        if !previous.allows_retry(round) {
            return Err(DebateError::InvalidPhase {
                action: "retry a participant",
                phase: previous,
            }
            .into());
        }

        self.session.phase = match round {
            Round::One => DebatePhase::Round1Running,
            Round::Two => DebatePhase::Round2Running,
        };
        let token = self.cancel.child_token();
        let outcome = self.run_participant(round, participant, &token).await;
        self.session.phase = previous;
        outcome.map_err(Into::into)
    }

    pub fn skip_round_two(&mut self) -> Result<()> {
        self.session.phase = self.session.phase.skip_round_two()?;
        tracing::info!(session = %self.session.id, "Round 2 skipped");
        Ok(())
    }

    /// Generate or regenerate the session summary, replacing any previous one.
    ///
    /// On failure the previous summary and phase are kept.
    pub async fn generate_summary(&mut self) -> Result<&Summary> {
        let previous = self.session.phase;
        let Some(source) = previous.summary_source() else {
            return Err(DebateError::InvalidPhase {
                action: "generate a summary",
                phase: previous,
            }
            .into());
        };

        let addendum = match source {
            SummarySource::BothRounds => self.session.addendum.committed().unwrap_or_default(),
            SummarySource::RoundOne => self.session.addendum.draft(),
        };
        let prompt = summary_prompt(
            &self.session.final_prompt,
            Some(addendum),
            &self.session.results,
            source == SummarySource::BothRounds,
        );

        self.session.phase = DebatePhase::SummaryPending(source);
        let token = self.cancel.child_token();
        let request = self.request(Role::Summarizer, prompt, SUMMARIZER_SYSTEM_PROMPT.to_string());
        let invocation = match self.service.run_role_with_cancel(request, &token).await {
            Ok(invocation) => invocation,
            Err(error) => {
                self.session.phase = previous;
                tracing::warn!(%source, error = %error, "Summary failed");
                return Err(error);
            }
        };

        self.session.usage.accumulate(&invocation.usage);
        self.session.phase = DebatePhase::SummaryDone(source);
        tracing::info!(
            %source,
            model = invocation.model_used.as_str(),
            "Summary generated"
        );
        Ok(self.session.summary.insert(Summary {
            text: invocation.content,
            source,
            model: invocation.model_used,
            generated_at: Utc::now(),
        }))
    }

    fn request(&self, role: Role, prompt: String, system_prompt: String) -> RunRoleRequest {
        let request = RunRoleRequest::new(role, prompt).with_system_prompt(system_prompt);
        match &self.role_models {
            Some(map) => request.with_role_models(map.clone()),
            None => request,
        }
    }

    /// Invoke one participant and append its result. Only cancellation is
    /// returned as an error; every other failure is recorded on the slot.
    async fn run_participant(
        &mut self,
        round: Round,
        participant: Participant,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), DebateError> {
        if cancel.is_cancelled() {
            return Err(DebateError::Cancelled);
        }

        let addendum = match round {
            Round::One => None,
            Round::Two => self.session.addendum.committed(),
        };
        let context = visible_context(&self.session.results, round, participant);
        let prompt = participant_prompt(
            &self.session.final_prompt,
            round,
            participant,
            addendum,
            &context,
        );
        let role = participant.role();
        let request = self.request(role, prompt, participant_system_prompt(round, participant));

        let result = match self.service.run_role_with_cancel(request, cancel).await {
            Ok(invocation) => {
                let output = structured::parse(&invocation.content, participant.label());
                tracing::info!(
                    round = round.number(),
                    %participant,
                    model = invocation.model_used.as_str(),
                    structured = output.is_structured(),
                    "Participant answered"
                );
                self.session.usage.accumulate(&invocation.usage);
                ParticipantResult {
                    round,
                    participant,
                    model: invocation.model_used,
                    raw: invocation.content,
                    output,
                    error: None,
                    usage: invocation.usage,
                    recorded_at: Utc::now(),
                }
            }
            Err(error) if error.is_cancelled() => return Err(DebateError::Cancelled),
            Err(error) => {
                let model = self
                    .service
                    .resolver()
                    .resolve(role, None, self.role_models.as_ref())
                    .unwrap_or_default();
                let message = with_context_hint(&failure_message(&error));
                tracing::warn!(
                    round = round.number(),
                    %participant,
                    model = model.as_str(),
                    error = message.as_str(),
                    "Participant failed"
                );
                ParticipantResult {
                    round,
                    participant,
                    model,
                    raw: String::new(),
                    output: ParsedOutput::Unparseable,
                    error: Some(message),
                    usage: Usage::default(),
                    recorded_at: Utc::now(),
                }
            }
        };

        self.session.results.append(result);
        Ok(())
    }
}

fn failure_message(error: &RoundtableError) -> String {
    match error {
        RoundtableError::Llm(inner) => inner.to_string(),
        other => other.to_string(),
    }
}
