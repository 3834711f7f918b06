use std::collections::HashSet;

use intent_election_core::*;
use proptest::prelude::*;

const LABELS: &[&str] = &["greet", "bye", "book", "cancel", "help", "none"];

fn raw_intent() -> impl Strategy<Value = RawIntent> {
    (prop::sample::select(LABELS), 0.01f64..=1.0).prop_map(|(label, c)| RawIntent::new(label, c))
}

fn election_input() -> impl Strategy<Value = ElectionInput> {
    let context = (
        0.0f64..=1.0,
        prop::collection::vec(raw_intent(), 0..5),
        0.0f64..=1.0,
        any::<bool>(),
    );
    prop::collection::vec(context, 1..5).prop_map(|contexts| {
        let mut predictions = Predictions::new();
        let mut included = IncludedContexts::new();
        for (i, (confidence, intents, oos, is_included)) in contexts.into_iter().enumerate() {
            let name = format!("ctx{i}");
            if is_included {
                included.insert(name.clone());
            }
            predictions.insert(name, RawContextPrediction { confidence, intents, oos });
        }
        ElectionInput::new(predictions, included)
    })
}

/// Feed a final ranking back in, one single-intent context per candidate,
/// with context names that sort in rank order.
fn as_ranked_input(result: &ElectionResult) -> ElectionInput {
    let mut ranked = result.intents.clone();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut predictions = Predictions::new();
    for (rank, c) in ranked.into_iter().enumerate() {
        predictions.insert(
            format!("{rank:04}-{}", c.context),
            RawContextPrediction {
                confidence: c.confidence,
                intents: vec![RawIntent::new(c.name, c.confidence)],
                oos: 0.0,
            },
        );
    }
    ElectionInput::include_all(predictions)
}

proptest! {
    #[test]
    fn normalized_included_confidences_sum_to_one(raw in prop::collection::vec(0.01f64..=1.0, 1..6)) {
        let sum: f64 = raw.iter().sum();
        let scale = sum.max(1.0);
        let mut predictions = Predictions::new();
        for (i, r) in raw.iter().enumerate() {
            predictions.insert(
                format!("ctx{i}"),
                RawContextPrediction { confidence: r / scale, intents: vec![], oos: 0.0 },
            );
        }
        let included: IncludedContexts = predictions.keys().cloned().collect();

        let scores = normalize_contexts(&predictions, &included).unwrap();
        let total: f64 = scores.iter().map(|s| s.normalized).sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "normalized sum {}", total);
    }

    #[test]
    fn final_intents_have_unique_names(input in election_input()) {
        let result = run_election(&input, &ElectionCfg::default()).unwrap();
        let mut seen = HashSet::new();
        for c in &result.intents {
            prop_assert!(seen.insert(c.name.clone()), "duplicate {}", c.name);
        }
    }

    #[test]
    fn confidences_stay_in_unit_interval(input in election_input()) {
        let result = run_election(&input, &ElectionCfg::default()).unwrap();
        prop_assert!(!result.intents.is_empty());
        for c in &result.intents {
            prop_assert!((0.0..=1.0).contains(&c.confidence), "{} out of range", c.confidence);
        }
        let elected = result.intent.as_ref().unwrap();
        prop_assert!(result.intents.iter().all(|c| c.confidence <= elected.confidence));
    }

    #[test]
    fn re_election_keeps_the_winner(input in election_input()) {
        let cfg = ElectionCfg::default();
        let first = run_election(&input, &cfg).unwrap();
        let second = run_election(&as_ranked_input(&first), &cfg).unwrap();
        prop_assert_eq!(first.elected_name(), second.elected_name());
    }

    #[test]
    fn ambiguity_needs_more_than_one_candidate(input in election_input()) {
        let result = run_election(&input, &ElectionCfg::default()).unwrap();
        if result.intents.len() <= 1 {
            prop_assert!(!result.ambiguous);
        }
    }
}
