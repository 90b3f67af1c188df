use super::debate_harness::{Reply, ScriptedProvider, debater_json, service, service_with, text};
use roundtable::debate::{DebateOrchestrator, Participant, Round};
use roundtable::error::{LlmError, RoundtableError};
use roundtable::{Role, RunRoleRequest};
use std::collections::BTreeMap;

#[tokio::test]
async fn rate_limited_debater_falls_back_to_next_pool_model() {
    let provider = ScriptedProvider::new(vec![
        Reply::Status(429),
        text(debater_json("A", "alpha", "none")),
        text(debater_json("B", "beta", "x")),
        text(debater_json("C", "gamma", "y")),
    ]);
    let mut orchestrator = DebateOrchestrator::from_final_prompt(service(provider.clone()), "Q")
        .with_role_models(BTreeMap::from([(Role::DebaterA, "m/m".to_string())]));
    orchestrator.run_round(Round::One).await.unwrap();

    let a = orchestrator
        .session()
        .results
        .latest(Round::One, Participant::A)
        .unwrap();
    assert!(a.is_success());
    assert_eq!(a.model, "n/n");
    let models = provider.models();
    assert_eq!(&models[..2], &["m/m".to_string(), "n/n".to_string()]);
    assert!(!models.contains(&"o/o".to_string()));
}

#[tokio::test]
async fn exhausted_pool_names_every_attempted_model() {
    let provider = ScriptedProvider::new(vec![
        Reply::Status(429),
        Reply::Status(429),
        Reply::Status(429),
    ]);
    let service = service(provider.clone());

    let err = service
        .run_role(RunRoleRequest::new(Role::DebaterC, "hi").with_role_models(BTreeMap::from([(
            Role::DebaterC,
            "m/m".to_string(),
        )])))
        .await
        .unwrap_err();
    match err {
        RoundtableError::Llm(LlmError::FallbackExhausted { attempted }) => {
            assert_eq!(attempted, vec!["m/m", "n/n", "o/o"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn resolution_prefers_explicit_then_role_map_then_default() {
    let provider = ScriptedProvider::new(vec![text("1"), text("2"), text("3")]);
    let service = service(provider.clone());
    let map = BTreeMap::from([(Role::Refiner, "n/n".to_string())]);

    service
        .run_role(
            RunRoleRequest::new(Role::Refiner, "x")
                .with_model("o/o")
                .with_role_models(map.clone()),
        )
        .await
        .unwrap();
    service
        .run_role(RunRoleRequest::new(Role::Refiner, "x").with_role_models(map))
        .await
        .unwrap();
    service
        .run_role(RunRoleRequest::new(Role::Refiner, "x"))
        .await
        .unwrap();

    assert_eq!(
        provider.models(),
        vec!["o/o", "n/n", Role::Refiner.default_model()]
    );
}

#[tokio::test]
async fn token_budget_is_bounded_by_the_cap() {
    let per_role = BTreeMap::from([(Role::DebaterA, 900)]);
    let provider = ScriptedProvider::new(vec![text("a"), text("b")]);

    service_with(provider.clone(), 4096, per_role.clone())
        .run_role(RunRoleRequest::new(Role::DebaterA, "x"))
        .await
        .unwrap();
    service_with(provider.clone(), 500, per_role)
        .run_role(RunRoleRequest::new(Role::DebaterA, "x"))
        .await
        .unwrap();

    let budgets: Vec<Option<u32>> = provider.requests().iter().map(|r| r.max_tokens).collect();
    assert_eq!(budgets, vec![Some(900), Some(500)]);
}
