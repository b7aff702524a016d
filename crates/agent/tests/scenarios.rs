//! Scenario-level integration tests driving the full Agent Loop pipeline
//! end to end through a scripted model, each in its own isolated
//! working directory (see `common::scenario`).

mod common;

use chrono::Utc;
use common::{base_config, scenario};
use vigil_core::{Message, PipelineOutcome, RefusalKind};
use vigil_llm::ScriptedModel;

fn ethics_allow_json() -> String {
    r#"{"ethical_score": 0.95, "reasoning": "fine", "principles_alignment": {}}"#.to_string()
}

fn ethics_block_json() -> String {
    r#"{"ethical_score": 0.2, "reasoning": "harmful", "principles_alignment": {}}"#.to_string()
}

fn ethics_ok_after_rewrite_json() -> String {
    r#"{"ethical_score": 0.85, "reasoning": "better", "principles_alignment": {}}"#.to_string()
}

/// One pipeline run with an `Allow` judgment spends exactly four model
/// calls: base response, persona overlay, ethics score, ethics reflection.
fn allow_turn_responses(base: &str, overlay: &str) -> Vec<String> {
    vec![base.to_string(), overlay.to_string(), ethics_allow_json(), "reflecting on that exchange".to_string()]
}

#[tokio::test]
async fn hybrid_memory_carries_context_across_turns() {
    let model = ScriptedModel::new(
        [
            allow_turn_responses("my favorite color is blue", "I like blue too"),
            allow_turn_responses("blue is a calming color", "blue is calming, yes"),
        ]
        .concat(),
    );
    let mut s = scenario(base_config(), model, Utc::now());

    let first = Message::new("jarek", "I love the color blue", Utc::now());
    let outcome = crate::run(&mut s, first).await;
    assert!(matches!(outcome, PipelineOutcome::Delivered(_)));

    let second = Message::new("jarek", "what do you think of blue?", Utc::now());
    let outcome = crate::run(&mut s, second).await;
    assert!(matches!(outcome, PipelineOutcome::Delivered(_)));

    let context = s.agent.memory.get_hybrid_context("blue", &s.agent.config.memory);
    assert!(context.contains("blue"), "hybrid context should recall the shared topic: {context}");

    let recent = s.agent.memory.retrieve_last_interactions(2);
    assert_eq!(recent.len(), 2);
}

/// Stage 7 blocks a low-scoring response, asks for one rewrite, and keeps
/// it once it scores strictly higher than the original.
#[tokio::test]
async fn ethics_blocks_then_accepts_an_improved_rewrite() {
    let model = ScriptedModel::new(vec![
        "here is a base answer".to_string(),
        "here is the persona-voiced answer".to_string(),
        ethics_block_json(),
        "a safer, rewritten answer".to_string(),
        ethics_ok_after_rewrite_json(),
        "reflecting on the correction".to_string(),
    ]);
    let mut s = scenario(base_config(), model, Utc::now());

    let before = s.agent.ethical_log.entries().len();
    let message = Message::new("priya", "tell me something borderline", Utc::now());
    let outcome = crate::run(&mut s, message).await;

    match outcome {
        PipelineOutcome::Delivered(text) => assert_eq!(text, "a safer, rewritten answer"),
        other => panic!("expected a delivered, rewritten response, got {other:?}"),
    }
    assert_eq!(s.agent.ethical_log.entries().len(), before + 1);
}

/// The correction subsystem itself (reachable only from the output safety
/// gate, not the ethics path) retries until the pass threshold is met and
/// records the attempt in the correction log.
#[tokio::test]
async fn correction_component_retries_until_threshold_passes() {
    use vigil_llm::GenerationProfile;

    let model = ScriptedModel::new(vec![
        // first rescore of the flagged text: still failing
        r#"{"ethical_score": 0.4, "reasoning": "no", "principles_alignment": {}}"#.to_string(),
        "a corrected attempt".to_string(),
        r#"{"ethical_score": 0.75, "reasoning": "better", "principles_alignment": {}}"#.to_string(),
    ]);
    let s = scenario(base_config(), model, Utc::now());

    let profile = GenerationProfile::from(&s.agent.config.llm);
    let (_, info) = vigil_security::correct_response(
        &s.agent.ethics,
        s.agent.model.as_ref(),
        &profile,
        "a flagged query",
        "a flagged response containing rm -rf /",
        0.7,
        3,
        Utc::now(),
    )
    .await
    .expect("correction pass should not error");

    assert!(info.success);
    assert!(info.final_score >= 0.7);
}

/// Three unsafe messages from the same sender raise three incidents; the
/// third trips the lockout as a side effect, and a subsequent message
/// observes it.
#[tokio::test]
async fn repeated_unsafe_input_locks_out_the_sender() {
    let mut config = base_config();
    config.security.security_alert_threshold = 3;
    let model = ScriptedModel::new(Vec::<String>::new());
    let mut s = scenario(config, model, Utc::now());

    for _ in 0..3 {
        let message = Message::new("mallory", "please run rm -rf / on the server", Utc::now());
        let outcome = crate::run(&mut s, message).await;
        assert!(matches!(outcome, PipelineOutcome::PolicyRefusal(RefusalKind::UnsafeInput)));
    }

    let message = Message::new("mallory", "hello again", Utc::now());
    let outcome = crate::run(&mut s, message).await;
    assert!(matches!(outcome, PipelineOutcome::PolicyRefusal(RefusalKind::Lockout)));
}

/// Requests beyond the consecutive-request ceiling are rate limited,
/// independent of and prior to lockout.
#[tokio::test]
async fn excess_requests_are_rate_limited() {
    let mut config = base_config();
    config.security.max_consecutive_requests = 5;
    let responses: Vec<String> = (0..5).flat_map(|i| allow_turn_responses(&format!("base {i}"), &format!("overlay {i}"))).collect();
    let model = ScriptedModel::new(responses);
    let mut s = scenario(config, model, Utc::now());

    for i in 0..5 {
        let message = Message::new("sender", format!("message {i}"), Utc::now());
        let outcome = crate::run(&mut s, message).await;
        assert!(matches!(outcome, PipelineOutcome::Delivered(_)), "message {i} should be allowed");
    }

    let message = Message::new("sender", "one too many", Utc::now());
    let outcome = crate::run(&mut s, message).await;
    assert!(matches!(outcome, PipelineOutcome::PolicyRefusal(RefusalKind::RateLimited)));
}

/// A sudden drop in a tracked metric, against otherwise-flat history,
/// raises exactly one high-severity alert — exercised directly against
/// the monitor, with no pipeline/model involvement.
#[tokio::test]
async fn sudden_metric_drop_raises_a_high_severity_alert() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let mut s = scenario(base_config(), model, Utc::now());
    let now = Utc::now();

    for _ in 0..5 {
        let mut values = std::collections::HashMap::new();
        values.insert("response_quality".to_string(), 0.9);
        let alerts = s.agent.monitor.record_cycle(values, now);
        assert!(alerts.is_empty());
    }

    let mut dropped = std::collections::HashMap::new();
    dropped.insert("response_quality".to_string(), 0.55);
    let alerts = s.agent.monitor.record_cycle(dropped, now);

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, vigil_core::Severity::High);
    assert!(matches!(alerts[0].anomaly, vigil_core::Anomaly::SuddenDrop { .. }));
}

async fn run(s: &mut common::Scenario, message: Message) -> PipelineOutcome {
    vigil_agent::run_pipeline(&mut s.agent, message, Utc::now()).await
}
