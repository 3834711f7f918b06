use intent_election_core::{
    ElectionCfg, ElectionError, IntentLabel, Predictions, RawContextPrediction, RawIntent,
};
use intent_election_supervisor::*;

fn predictions(intents: &[(&str, f64)], oos: f64) -> Predictions {
    let mut p = Predictions::new();
    p.insert(
        "main".to_string(),
        RawContextPrediction {
            confidence: 1.0,
            intents: intents.iter().map(|(l, c)| RawIntent::new(*l, *c)).collect(),
            oos,
        },
    );
    p
}

fn event(id: &str, stream: &str, intents: &[(&str, f64)]) -> UtteranceEvent {
    let preds = predictions(intents, 0.0);
    let included = preds.keys().cloned().collect();
    UtteranceEvent::new(id, stream).with_predictions(preds).with_included(included)
}

#[test]
fn batch_preserves_input_order() {
    let sup = ElectionSupervisor::new(4, ElectionCfg::default());
    let events: Vec<UtteranceEvent> = (0..32)
        .map(|i| event(&format!("u{i}"), &format!("s{}", i % 3), &[("x", 0.9), ("y", 0.1)]))
        .collect();

    let actions = sup.elect_batch(&BasicInputBuilder::default(), &events);
    let ids: Vec<&str> = actions.iter().map(|a| a.utterance_id.as_str()).collect();
    let expected: Vec<String> = (0..32).map(|i| format!("u{i}")).collect();
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(actions.iter().all(|a| a.result.is_some()));
}

#[test]
fn tallies_count_outcomes_per_stream() {
    let sup = ElectionSupervisor::new(2, ElectionCfg::default());
    let events = vec![
        event("u1", "bot-a", &[("x", 0.9), ("y", 0.1)]),
        event("u2", "bot-a", &[("x", 0.5), ("y", 0.5)]),
        event("u3", "bot-b", &[("none", 0.9), ("y", 0.1)]),
        event("u4", "bot-b", &[("x", f64::NAN)]),
    ];
    let actions = sup.elect_batch(&BasicInputBuilder::default(), &events);
    assert!(actions[3].error.is_some());

    assert_eq!(
        sup.tally("bot-a"),
        Some(ElectionTally { elected: 2, no_intent: 0, ambiguous: 1, failed: 0 })
    );
    assert_eq!(
        sup.tally("bot-b"),
        Some(ElectionTally { elected: 0, no_intent: 1, ambiguous: 0, failed: 1 })
    );
    assert_eq!(sup.tally("bot-c"), None);
}

#[test]
fn cfg_override_applies_to_its_stream_only() {
    let mut sup = ElectionSupervisor::new(1, ElectionCfg::default());
    let strict = ElectionCfg {
        ambiguity_band: 0.5,
        ..ElectionCfg::default()
    };
    sup.set_cfg_override("strict", strict);

    let events = vec![
        event("u1", "strict", &[("x", 0.9), ("y", 0.1)]),
        event("u2", "relaxed", &[("x", 0.9), ("y", 0.1)]),
    ];
    let actions = sup.elect_batch(&BasicInputBuilder::default(), &events);
    assert!(actions[0].result.as_ref().unwrap().ambiguous);
    assert!(!actions[1].result.as_ref().unwrap().ambiguous);

    sup.clear_cfg_override("strict");
    let actions = sup.elect_batch(&BasicInputBuilder::default(), &events[..1]);
    assert!(!actions[0].result.as_ref().unwrap().ambiguous);
}

#[test]
fn sanitizer_clamps_or_rejects() {
    let clamp = ScoreSanitizer { clamp_unit: true };
    assert_eq!(clamp.check("c", 1.2).unwrap(), 1.0);
    assert_eq!(clamp.check("c", -0.1).unwrap(), 0.0);
    assert!(matches!(clamp.check("c", f64::INFINITY), Err(ElectionError::DegenerateInput { .. })));

    let strict = ScoreSanitizer { clamp_unit: false };
    assert!(matches!(strict.check("c", 1.2), Err(ElectionError::InvalidInput { .. })));
    assert_eq!(strict.check("c", 0.3).unwrap(), 0.3);
}

#[test]
fn builder_drops_included_contexts_without_predictions() {
    let mut ev = event("u1", "s", &[("x", 1.0)]);
    ev.included_contexts.insert("ghost".to_string());

    let inputs = build_input_batch(&BasicInputBuilder::default(), &[ev]);
    let input = inputs[0].as_ref().unwrap();
    assert_eq!(input.included_contexts.len(), 1);
    assert!(input.included_contexts.contains("main"));
}

#[test]
fn snapshot_restore_and_merge() {
    let sup = ElectionSupervisor::new(3, ElectionCfg::default());
    let events = vec![
        event("u1", "a", &[("x", 0.9), ("y", 0.1)]),
        event("u2", "b", &[("x", 0.9), ("y", 0.1)]),
    ];
    sup.elect_batch(&BasicInputBuilder::default(), &events);

    let snap = sup.snapshot();
    assert_eq!(
        snap.tallies.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    assert_eq!(sup.snapshot_streams(&["b"]).tallies.len(), 1);

    sup.elect_batch(&BasicInputBuilder::default(), &[event("u3", "c", &[("x", 1.0)])]);
    let stats = sup.restore(snap.clone());
    assert_eq!(stats, RestoreStats { applied: 2, overwritten: 0 });
    assert_eq!(sup.tally("c"), None);

    sup.elect_batch(&BasicInputBuilder::default(), &[event("u4", "c", &[("x", 1.0)])]);
    let stats = sup.restore_merge(snap);
    assert_eq!(stats, RestoreStats { applied: 2, overwritten: 2 });
    assert!(sup.tally("c").is_some());

    sup.clear_stream("c");
    assert_eq!(sup.tally("c"), None);
}

#[test]
fn actions_serialize_with_wire_labels() {
    let sup = ElectionSupervisor::new(1, ElectionCfg::default());
    let actions = sup.elect_batch(
        &BasicInputBuilder::default(),
        &[event("u1", "s", &[("none", 0.9), ("y", 0.1)])],
    );
    assert_eq!(
        actions[0].result.as_ref().unwrap().intent.as_ref().unwrap().name,
        IntentLabel::NoIntent
    );
    let json = serde_json::to_value(&actions).unwrap();
    assert_eq!(json[0]["utteranceId"], "u1");
    assert_eq!(json[0]["result"]["intent"]["name"], "none");
    assert!(json[0].get("error").is_none());
}
