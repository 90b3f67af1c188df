//! Debate state machine: phases, the append-only result log and the addendum.

use super::structured::ParsedOutput;
use crate::error::DebateError;
use crate::llm::Usage;
use crate::roles::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    One,
    Two,
}

impl Round {
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {}", self.number())
    }
}

static INVOCATION_ORDER: [Participant; 3] = [Participant::A, Participant::B, Participant::C];

/// One of the three fixed debater positions. Order is invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Participant {
    A,
    B,
    C,
}

impl Participant {
    pub const ALL: [Participant; 3] = INVOCATION_ORDER;

    pub fn role(self) -> Role {
        match self {
            Self::A => Role::DebaterA,
            Self::B => Role::DebaterB,
            Self::C => Role::DebaterC,
        }
    }

    pub fn position(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::A => "Debater A",
            Self::B => "Debater B",
            Self::C => "Debater C",
        }
    }

    /// Participants that run before `self` within a round.
    pub fn predecessors(self) -> &'static [Participant] {
        &INVOCATION_ORDER[..self.position()]
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one participant invocation. Never mutated after it is logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantResult {
    pub round: Round,
    pub participant: Participant,
    /// Model that answered, or the resolved model when the call failed.
    pub model: String,
    pub raw: String,
    pub output: ParsedOutput,
    pub error: Option<String>,
    pub usage: Usage,
    pub recorded_at: DateTime<Utc>,
}

impl ParticipantResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Append-only log of participant results keyed by (round, participant).
///
/// A retry appends a newer entry; readers always see the latest entry per key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultLog {
    entries: Vec<ParticipantResult>,
}

impl ResultLog {
    pub fn append(&mut self, result: ParticipantResult) {
        self.entries.push(result);
    }

    pub fn entries(&self) -> &[ParticipantResult] {
        &self.entries
    }

    pub fn latest(&self, round: Round, participant: Participant) -> Option<&ParticipantResult> {
        self.entries
            .iter()
            .rev()
            .find(|r| r.round == round && r.participant == participant)
    }

    /// Latest result per populated slot, in participant order.
    pub fn round(&self, round: Round) -> Vec<&ParticipantResult> {
        Participant::ALL
            .iter()
            .filter_map(|p| self.latest(round, *p))
            .collect()
    }

    /// A round is complete once every slot is populated, success or not.
    pub fn is_round_complete(&self, round: Round) -> bool {
        Participant::ALL
            .iter()
            .all(|p| self.latest(round, *p).is_some())
    }
}

/// Which rounds a summary was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    RoundOne,
    BothRounds,
}

impl fmt::Display for SummarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundOne => write!(f, "round 1"),
            Self::BothRounds => write!(f, "rounds 1 and 2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub source: SummarySource,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

/// Debate progress as a single tagged state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "source", rename_all = "snake_case")]
pub enum DebatePhase {
    NotStarted,
    Round1Running,
    Round1Done,
    Round2Running,
    Round2Done,
    Round2Skipped,
    SummaryPending(SummarySource),
    SummaryDone(SummarySource),
}

impl DebatePhase {
    /// Phase entered when `round` starts, if it may start from `self`.
    pub fn begin_round(self, round: Round) -> Result<Self, DebateError> {
        match (self, round) {
            (Self::NotStarted, Round::One) => Ok(Self::Round1Running),
            (Self::Round1Done, Round::Two) => Ok(Self::Round2Running),
            _ => Err(DebateError::InvalidPhase {
                action: match round {
                    Round::One => "start round 1",
                    Round::Two => "start round 2",
                },
                phase: self,
            }),
        }
    }

    pub fn finish_round(round: Round) -> Self {
        match round {
            Round::One => Self::Round1Done,
            Round::Two => Self::Round2Done,
        }
    }

    pub fn skip_round_two(self) -> Result<Self, DebateError> {
        match self {
            Self::Round1Done => Ok(Self::Round2Skipped),
            _ => Err(DebateError::InvalidPhase {
                action: "skip round 2",
                phase: self,
            }),
        }
    }

    /// Source the next summary is built from, if a summary may be generated now.
    ///
    /// Summarizing straight from `Round1Done` takes the skip path.
    pub fn summary_source(self) -> Option<SummarySource> {
        match self {
            Self::Round1Done | Self::Round2Skipped => Some(SummarySource::RoundOne),
            Self::Round2Done => Some(SummarySource::BothRounds),
            Self::SummaryDone(source) => Some(source),
            _ => None,
        }
    }

    /// The draft stays editable until round 2 starts.
    pub fn allows_addendum_edit(self) -> bool {
        !matches!(
            self,
            Self::Round2Running
                | Self::Round2Done
                | Self::SummaryPending(SummarySource::BothRounds)
                | Self::SummaryDone(SummarySource::BothRounds)
        )
    }

    /// Whether a single participant of `round` may be re-run.
    pub fn allows_retry(self, round: Round) -> bool {
        matches!(
            (self, round),
            (Self::Round1Done, Round::One) | (Self::Round2Done, Round::Two)
        )
    }
}

impl fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Round1Running => write!(f, "running round 1"),
            Self::Round1Done => write!(f, "done with round 1"),
            Self::Round2Running => write!(f, "running round 2"),
            Self::Round2Done => write!(f, "done with round 2"),
            Self::Round2Skipped => write!(f, "past a skipped round 2"),
            Self::SummaryPending(source) => write!(f, "summarizing {source}"),
            Self::SummaryDone(source) => write!(f, "summarized from {source}"),
        }
    }
}

/// User-supplied extra context for round 2 and the summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Addendum {
    draft: String,
    committed: Option<String>,
}

impl Addendum {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn committed(&self) -> Option<&str> {
        self.committed.as_deref()
    }

    pub(super) fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Freeze the current draft as the round-2 addendum.
    pub(super) fn commit(&mut self) -> &str {
        self.committed.insert(self.draft.clone())
    }
}

/// Everything produced for one user request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSession {
    pub id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
    pub raw_request: String,
    pub final_prompt: String,
    pub refiner_model: Option<String>,
    pub phase: DebatePhase,
    pub results: ResultLog,
    pub addendum: Addendum,
    pub summary: Option<Summary>,
    pub usage: Usage,
}

impl DebateSession {
    pub fn new(raw_request: impl Into<String>, final_prompt: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            created_at: Utc::now(),
            raw_request: raw_request.into(),
            final_prompt: final_prompt.into(),
            refiner_model: None,
            phase: DebatePhase::NotStarted,
            results: ResultLog::default(),
            addendum: Addendum::default(),
            summary: None,
            usage: Usage::default(),
        }
    }
}
