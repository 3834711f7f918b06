use std::collections::HashSet;

use tracing::debug;

use crate::aggregate::desc;
use crate::cfg::ElectionCfg;
use crate::model::{CandidatePrediction, ElectionInput, IntentLabel, GLOBAL_CONTEXT};

/// Ranked, deduplicated candidates plus the elected winner.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalElection {
    pub elected: Option<CandidatePrediction>,
    pub intents: Vec<CandidatePrediction>,
}

/// Merge per-context emissions into one global ranking and pick the winner.
pub fn elect_global(
    mut candidates: Vec<CandidatePrediction>,
    input: &ElectionInput,
    cfg: &ElectionCfg,
) -> GlobalElection {
    candidates.sort_by(|a, b| desc(a.confidence, b.confidence));

    let mut seen: HashSet<IntentLabel> = HashSet::new();
    let mut intents: Vec<CandidatePrediction> = candidates
        .into_iter()
        .filter(|c| input.included_contexts.contains(&c.context))
        .filter(|c| seen.insert(c.name.clone()))
        .collect();

    let primary_context = intents
        .first()
        .map(|c| c.context.clone())
        .unwrap_or_else(|| GLOBAL_CONTEXT.to_string());
    let primary_oos = input.oos(&primary_context);

    let weak_top = intents.first().is_some_and(|top| {
        !top.name.is_no_intent()
            && top.confidence < cfg.low_intent_confidence
            && primary_oos.is_some_and(|oos| oos > cfg.oos_as_none)
    });

    if intents.is_empty() || weak_top {
        debug!(
            context = %primary_context,
            empty = intents.is_empty(),
            "falling back to none candidate"
        );
        intents.retain(|c| !c.name.is_no_intent());
        intents.push(CandidatePrediction::new(
            IntentLabel::NoIntent,
            primary_context,
            // absent or zero OOS counts as 1
            primary_oos.filter(|oos| *oos != 0.0).unwrap_or(1.0),
        ));
        // Ascending on purpose: this branch has always ranked worst-first.
        intents.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));
    }

    let elected = first_max(&intents).cloned();
    GlobalElection { elected, intents }
}

/// First candidate holding the maximum confidence, whatever the list order.
fn first_max(intents: &[CandidatePrediction]) -> Option<&CandidatePrediction> {
    intents.iter().fold(None, |best, c| match best {
        Some(b) if c.confidence <= b.confidence => Some(b),
        _ => Some(c),
    })
}
