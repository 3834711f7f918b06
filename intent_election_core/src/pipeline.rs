use tracing::{debug, warn};

use crate::aggregate::aggregate_all;
use crate::ambiguity::detect_ambiguity;
use crate::cfg::ElectionCfg;
use crate::elect::elect_global;
use crate::error::ElectionError;
use crate::model::{ElectionInput, ElectionResult, IntentLabel};
use crate::normalize::normalize_contexts;
use crate::slots::resolve_slots;

/// Run the full election over one utterance's predictions:
/// normalize, aggregate per context, elect, flag ambiguity, attach slots.
pub fn run_election(input: &ElectionInput, cfg: &ElectionCfg) -> Result<ElectionResult, ElectionError> {
    let scores = normalize_contexts(&input.predictions, &input.included_contexts)?;
    let candidates = aggregate_all(&scores, &input.predictions, cfg)?;
    debug!(
        contexts = scores.len(),
        candidates = candidates.len(),
        "per-context aggregation done"
    );

    let election = elect_global(candidates, input, cfg);
    let ambiguous = detect_ambiguity(&election.intents, cfg);

    let mut result = ElectionResult {
        intent: election.elected,
        intents: election.intents,
        ambiguous,
        slots: None,
    };

    if let Some(elected) = result.intent.as_ref() {
        let has_name = !matches!(&elected.name, IntentLabel::Named(s) if s.is_empty());
        if has_name && !input.predictions.is_empty() && !ambiguous {
            match resolve_slots(elected, &input.predictions) {
                Ok(slots) => result.slots = Some(slots),
                Err(err @ ElectionError::NotFound { .. }) => {
                    warn!(%err, "elected intent has no raw entry; returning without slots");
                }
                Err(err) => return Err(err),
            }
        }
    }

    debug!(
        elected = result.intent.as_ref().map(|c| c.name.as_str()).unwrap_or_default(),
        ambiguous = result.ambiguous,
        "election done"
    );
    Ok(result)
}
