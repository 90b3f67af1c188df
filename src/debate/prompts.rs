//! Prompt text and context rendering for each pipeline stage.
//!
//! Everything here is a pure function of prior results so that a given
//! session state always produces byte-identical prompts.

use super::state::{Participant, ParticipantResult, ResultLog, Round};
use std::fmt::Write as _;

const OUTPUT_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{"speaker": "<your label>", "new_perspectives": [{"id": "p1", "contents": "<one perspective>"}], "counterpoints": [{"id": "c1", "contents": "<one rebuttal of an earlier view>"}]}"#;

pub const REFINER_SYSTEM_PROMPT: &str = "You rewrite a user's request into a clear, self-contained \
question for a panel of three debaters. Keep the user's intent and language, make implicit \
constraints explicit, and drop filler. Reply with the rewritten question only.";

pub const SUMMARIZER_SYSTEM_PROMPT: &str = "You are the moderator of a three-person panel. \
Summarize the debate for the user: state the strongest perspectives, where the debaters \
disagreed and why, and give a balanced conclusion that answers the original question. \
Use plain prose with short headed sections.";

fn stance(participant: Participant) -> &'static str {
    match participant {
        Participant::A => "You argue constructively: propose the most promising answers and the reasoning behind them.",
        Participant::B => "You are the skeptic: probe assumptions, risks and failure modes in what has been said.",
        Participant::C => "You are the lateral thinker: bring in angles nobody has raised and reconcile conflicting views where possible.",
    }
}

/// System instruction for `participant` in `round`.
///
/// Round 1 participant A opens the debate, so it is not required to give
/// counterpoints; every other slot must.
pub fn participant_system_prompt(round: Round, participant: Participant) -> String {
    let counterpoint_rule = if round == Round::One && participant == Participant::A {
        "You speak first. Counterpoints are optional; leave the array empty if there is nothing to rebut."
    } else {
        "You must include at least one counterpoint that rebuts a specific earlier view."
    };
    format!(
        "You are {label} in a three-person panel debate ({round}). {stance}\n\
         Use \"{label}\" as your speaker label.\n\
         {counterpoint_rule}\n\
         Each entry must be one self-contained point.\n\n{OUTPUT_FORMAT}",
        label = participant.label(),
        stance = stance(participant),
    )
}

fn render_structured(result: &ParticipantResult, out: &mut String) {
    let Some(output) = result.output.structured() else {
        return;
    };
    let _ = writeln!(
        out,
        "[{} / {}] {}:",
        result.round,
        result.participant.label(),
        output.speaker
    );
    for perspective in &output.new_perspectives {
        let _ = writeln!(out, "- Perspective: {perspective}");
    }
    for counterpoint in &output.counterpoints {
        let _ = writeln!(out, "- Counterpoint: {counterpoint}");
    }
}

/// Results visible to `participant` in `round`.
///
/// Round 2 sees every structured round-1 output. Within the current round
/// only structured outputs of earlier positions are visible.
pub fn visible_context(
    log: &ResultLog,
    round: Round,
    participant: Participant,
) -> Vec<&ParticipantResult> {
    let mut visible: Vec<&ParticipantResult> = Vec::new();
    if round == Round::Two {
        visible.extend(log.round(Round::One));
    }
    visible.extend(
        participant
            .predecessors()
            .iter()
            .filter_map(|p| log.latest(round, *p)),
    );
    visible.retain(|r| r.output.is_structured());
    visible
}

/// User message for `participant` in `round`.
pub fn participant_prompt(
    final_prompt: &str,
    round: Round,
    participant: Participant,
    addendum: Option<&str>,
    context: &[&ParticipantResult],
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Question under debate:\n{}\n", final_prompt.trim());

    match round {
        Round::One => {
            let _ = writeln!(
                prompt,
                "Give your opening position as {}.",
                participant.label()
            );
        }
        Round::Two => {
            let _ = writeln!(
                prompt,
                "This is the second round. Build on round 1, rebut what you disagree with and add what is still missing."
            );
            if let Some(addendum) = addendum.map(str::trim).filter(|a| !a.is_empty()) {
                let _ = writeln!(prompt, "\nAdditional context from the user:\n{addendum}");
            }
        }
    }

    if !context.is_empty() {
        let _ = writeln!(prompt, "\nWhat has been said so far:");
        for result in context {
            render_structured(result, &mut prompt);
        }
    }
    prompt
}

pub fn refiner_prompt(raw_request: &str) -> String {
    format!("Rewrite this request:\n{}", raw_request.trim())
}

fn render_round_for_summary(log: &ResultLog, round: Round, out: &mut String) {
    let _ = writeln!(out, "\n## {}", capitalize(&round.to_string()));
    for participant in Participant::ALL {
        match log.latest(round, participant) {
            Some(result) if result.output.is_structured() => render_structured(result, out),
            Some(result) if result.error.is_none() && !result.raw.trim().is_empty() => {
                let _ = writeln!(
                    out,
                    "[{round} / {}] (unstructured reply):\n{}",
                    participant.label(),
                    result.raw.trim()
                );
            }
            Some(result) => {
                let _ = writeln!(
                    out,
                    "[{round} / {}] gave no usable answer{}",
                    participant.label(),
                    result
                        .error
                        .as_deref()
                        .map(|e| format!(" ({e})"))
                        .unwrap_or_default()
                );
            }
            None => {}
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// User message for the summarizer.
pub fn summary_prompt(
    final_prompt: &str,
    addendum: Option<&str>,
    log: &ResultLog,
    include_round_two: bool,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Original question:\n{}", final_prompt.trim());
    if let Some(addendum) = addendum.map(str::trim).filter(|a| !a.is_empty()) {
        let _ = writeln!(prompt, "\nAdditional context from the user:\n{addendum}");
    }
    render_round_for_summary(log, Round::One, &mut prompt);
    if include_round_two {
        render_round_for_summary(log, Round::Two, &mut prompt);
    }
    prompt
}

const CONTEXT_OVERFLOW_MARKERS: [&str; 7] = [
    "context length",
    "context_length",
    "context window",
    "maximum context",
    "too many tokens",
    "token limit",
    "prompt is too long",
];

/// Append a hint when an error reads like a context-window overflow.
pub fn with_context_hint(error: &str) -> String {
    let lower = error.to_ascii_lowercase();
    if CONTEXT_OVERFLOW_MARKERS.iter().any(|m| lower.contains(m)) {
        format!(
            "{error} (hint: the accumulated debate may exceed this model's context window; \
             pick a model with a larger context or shorten the question)"
        )
    } else {
        error.to_string()
    }
}
