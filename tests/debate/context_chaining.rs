use super::debate_harness::{Reply, ScriptedProvider, debater_json, service, text};
use roundtable::debate::{DebateOrchestrator, DebatePhase, Participant, ParsedOutput, Round};

#[tokio::test]
async fn round_one_prompts_only_see_earlier_participants() {
    let provider = ScriptedProvider::new(vec![
        text(debater_json("A", "alpha-view", "none")),
        text(debater_json("B", "beta-view", "alpha is wrong")),
        text(debater_json("C", "gamma-view", "beta is wrong")),
    ]);
    let mut orchestrator = DebateOrchestrator::from_final_prompt(service(provider.clone()), "Q");
    orchestrator.run_round(Round::One).await.unwrap();

    let prompts = provider.user_prompts();
    assert!(!prompts[0].contains("alpha-view"));
    assert!(prompts[1].contains("alpha-view"));
    assert!(!prompts[1].contains("beta-view"));
    assert!(prompts[2].contains("alpha-view"));
    assert!(prompts[2].contains("beta-view"));
    assert!(!prompts[2].contains("gamma-view"));
}

#[tokio::test]
async fn round_completes_with_three_slots_even_when_every_call_fails() {
    let provider = ScriptedProvider::new(vec![
        Reply::Status(500),
        Reply::Status(502),
        Reply::Status(400),
    ]);
    let mut orchestrator = DebateOrchestrator::from_final_prompt(service(provider), "Q");
    orchestrator.run_round(Round::One).await.unwrap();

    assert_eq!(orchestrator.phase(), DebatePhase::Round1Done);
    let round = orchestrator.session().results.round(Round::One);
    assert_eq!(round.len(), 3);
    assert!(round.iter().all(|r| r.error.is_some()));
    assert!(round.iter().all(|r| r.output == ParsedOutput::Unparseable));
}

#[tokio::test]
async fn round_two_includes_only_structured_round_one_output() {
    let provider = ScriptedProvider::new(vec![
        text(debater_json("A", "alpha-view", "none")),
        text("I refuse to answer in JSON: beta-prose"),
        Reply::Status(500),
        text(debater_json("A", "alpha-again", "x")),
        text(debater_json("B", "beta-again", "y")),
        text(debater_json("C", "gamma-again", "z")),
    ]);
    let mut orchestrator = DebateOrchestrator::from_final_prompt(service(provider.clone()), "Q");
    orchestrator.run_round(Round::One).await.unwrap();
    orchestrator.run_round(Round::Two).await.unwrap();

    let prompts = provider.user_prompts();
    let round_two_a = &prompts[3];
    assert!(round_two_a.contains("alpha-view"));
    assert!(!round_two_a.contains("beta-prose"));
    assert!(!round_two_a.contains("scripted 500"));

    let round_two_c = &prompts[5];
    assert!(round_two_c.contains("alpha-view"));
    assert!(round_two_c.contains("alpha-again"));
    assert!(round_two_c.contains("beta-again"));

    let b = orchestrator
        .session()
        .results
        .latest(Round::One, Participant::B)
        .unwrap();
    assert!(b.is_success());
    assert!(b.raw.contains("beta-prose"));
}

#[tokio::test]
async fn context_overflow_failures_carry_a_hint() {
    let provider = ScriptedProvider::new(vec![
        text(debater_json("A", "alpha", "none")),
        Reply::Failure(400, "This model's maximum context length is 8192 tokens"),
        Reply::Status(400),
    ]);
    let mut orchestrator = DebateOrchestrator::from_final_prompt(service(provider), "Q");
    orchestrator.run_round(Round::One).await.unwrap();

    let log = &orchestrator.session().results;
    let b = log.latest(Round::One, Participant::B).unwrap();
    assert!(b.error.as_deref().unwrap().contains("hint:"));
    let c = log.latest(Round::One, Participant::C).unwrap();
    assert!(!c.error.as_deref().unwrap().contains("hint:"));
}

#[tokio::test]
async fn retried_participant_never_sees_later_positions() {
    let provider = ScriptedProvider::new(vec![
        text(debater_json("A", "alpha-view", "none")),
        text(debater_json("B", "beta-view", "x")),
        text(debater_json("C", "gamma-view", "y")),
        text(debater_json("B", "beta-retry", "x")),
        text(debater_json("A", "alpha-two", "p")),
        text(debater_json("B", "beta-two", "q")),
        text(debater_json("C", "gamma-two", "r")),
        text(debater_json("A", "alpha-two-retry", "s")),
    ]);
    let mut orchestrator = DebateOrchestrator::from_final_prompt(service(provider.clone()), "Q");
    orchestrator.run_round(Round::One).await.unwrap();
    orchestrator
        .retry_participant(Round::One, Participant::B)
        .await
        .unwrap();

    let prompts = provider.user_prompts();
    let retry_b = &prompts[3];
    assert!(retry_b.contains("alpha-view"));
    assert!(!retry_b.contains("beta-view"));
    assert!(!retry_b.contains("gamma-view"));

    orchestrator.run_round(Round::Two).await.unwrap();
    orchestrator
        .retry_participant(Round::Two, Participant::A)
        .await
        .unwrap();

    let prompts = provider.user_prompts();
    assert_eq!(prompts.len(), 8);
    let retry_a = &prompts[7];
    assert!(retry_a.contains("alpha-view"));
    assert!(retry_a.contains("beta-retry"));
    assert!(!retry_a.contains("beta-view"));
    assert!(retry_a.contains("gamma-view"));
    assert!(!retry_a.contains("alpha-two"));
    assert!(!retry_a.contains("beta-two"));
    assert!(!retry_a.contains("gamma-two"));
    assert_eq!(orchestrator.phase(), DebatePhase::Round2Done);
}
