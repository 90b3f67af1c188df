//! Refiner, three-participant debate rounds and the summary stage.

pub mod orchestrator;
pub mod prompts;
pub mod state;
pub mod structured;

pub use orchestrator::DebateOrchestrator;
pub use state::{
    Addendum, DebatePhase, DebateSession, Participant, ParticipantResult, ResultLog, Round,
    Summary, SummarySource,
};
pub use structured::{ParsedOutput, StructuredOutput};
