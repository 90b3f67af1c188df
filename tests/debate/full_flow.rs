use super::debate_harness::{ScriptedProvider, debater_json, service, text};
use roundtable::debate::{DebateOrchestrator, DebatePhase, Round, SummarySource};

fn two_round_script() -> Vec<super::debate_harness::Reply> {
    vec![
        text("Should a small team adopt Rust for its backend?"),
        text(debater_json("A", "memory safety", "none")),
        text(debater_json("B", "hiring is hard", "safety is overrated")),
        text(debater_json("C", "start with one service", "hiring can be trained")),
        text(debater_json("A", "gradual adoption", "training costs")),
        text(debater_json("B", "tooling is mature", "one service is too little")),
        text(debater_json("C", "pilot then decide", "maturity varies")),
        text("Adopt Rust gradually."),
    ]
}

#[tokio::test]
async fn refine_debate_two_rounds_and_summarize() {
    let provider = ScriptedProvider::new(two_round_script());
    let mut orchestrator =
        DebateOrchestrator::start(service(provider.clone()), "rust for backend??", None)
            .await
            .unwrap();
    assert_eq!(
        orchestrator.session().final_prompt,
        "Should a small team adopt Rust for its backend?"
    );

    orchestrator.run_round(Round::One).await.unwrap();
    orchestrator.set_addendum_draft("team of four").unwrap();
    orchestrator.run_round(Round::Two).await.unwrap();
    let summary = orchestrator.generate_summary().await.unwrap();
    assert_eq!(summary.text, "Adopt Rust gradually.");
    assert_eq!(summary.source, SummarySource::BothRounds);
    assert_eq!(
        orchestrator.phase(),
        DebatePhase::SummaryDone(SummarySource::BothRounds)
    );

    let prompts = provider.user_prompts();
    assert_eq!(prompts.len(), 8);
    for round_two_prompt in &prompts[4..7] {
        assert!(round_two_prompt.contains("team of four"));
    }
    let summary_prompt = &prompts[7];
    assert!(summary_prompt.contains("Should a small team adopt Rust"));
    assert!(summary_prompt.contains("team of four"));
    assert!(summary_prompt.contains("memory safety"));
    assert!(summary_prompt.contains("pilot then decide"));

    let session = orchestrator.into_session();
    assert_eq!(session.usage.total_tokens, 8 * 15);
    assert_eq!(session.results.entries().len(), 6);

    let exported = serde_json::to_value(&session).unwrap();
    assert_eq!(exported["phase"]["phase"], "summary_done");
    assert_eq!(exported["summary"]["text"], "Adopt Rust gradually.");
}

#[tokio::test]
async fn skip_path_summarizes_round_one_with_live_draft() {
    let provider = ScriptedProvider::new(vec![
        text(debater_json("A", "alpha", "none")),
        text(debater_json("B", "beta", "against alpha")),
        text(debater_json("C", "gamma", "against beta")),
        text("summary"),
    ]);
    let mut orchestrator = DebateOrchestrator::from_final_prompt(service(provider.clone()), "Q");

    orchestrator.run_round(Round::One).await.unwrap();
    orchestrator.set_addendum_draft("early note").unwrap();
    orchestrator.skip_round_two().unwrap();
    orchestrator.set_addendum_draft("late note").unwrap();
    orchestrator.generate_summary().await.unwrap();

    let summary_prompt = provider.user_prompts().pop().unwrap();
    assert!(summary_prompt.contains("late note"));
    assert!(!summary_prompt.contains("early note"));
    assert!(!summary_prompt.contains("Round 2"));
    assert_eq!(orchestrator.session().addendum.committed(), None);
    assert!(orchestrator.run_round(Round::Two).await.is_err());
}

#[tokio::test]
async fn regenerating_summary_replaces_previous_one() {
    let provider = ScriptedProvider::new(vec![
        text(debater_json("A", "alpha", "none")),
        text(debater_json("B", "beta", "x")),
        text(debater_json("C", "gamma", "y")),
        text("first summary"),
        text("second summary"),
    ]);
    let mut orchestrator = DebateOrchestrator::from_final_prompt(service(provider), "Q");
    orchestrator.run_round(Round::One).await.unwrap();
    orchestrator.skip_round_two().unwrap();

    orchestrator.generate_summary().await.unwrap();
    let regenerated = orchestrator.generate_summary().await.unwrap();
    assert_eq!(regenerated.text, "second summary");
    assert_eq!(regenerated.source, SummarySource::RoundOne);
    assert_eq!(
        orchestrator.session().summary.as_ref().map(|s| s.text.as_str()),
        Some("second summary")
    );
}

#[tokio::test]
async fn summary_straight_after_round_one_takes_the_skip_path() {
    let provider = ScriptedProvider::new(vec![
        text(debater_json("A", "alpha", "none")),
        text(debater_json("B", "beta", "x")),
        text(debater_json("C", "gamma", "y")),
        text("summary"),
    ]);
    let mut orchestrator = DebateOrchestrator::from_final_prompt(service(provider), "Q");
    orchestrator.run_round(Round::One).await.unwrap();

    let summary = orchestrator.generate_summary().await.unwrap();
    assert_eq!(summary.source, SummarySource::RoundOne);
    assert!(orchestrator.run_round(Round::Two).await.is_err());
}
