//! Statistical intent election over an ensemble of per-context classifiers.
//!
//! Pure, synchronous and stateless: one [`ElectionInput`] in, one
//! [`ElectionResult`] out. Safe to call concurrently for independent utterances.

pub mod aggregate;
pub mod ambiguity;
pub mod cfg;
pub mod elect;
pub mod error;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod slots;
pub mod stats;

pub use aggregate::{aggregate_all, aggregate_context, candidates_for_context, predictions_really_confused};
pub use ambiguity::detect_ambiguity;
pub use cfg::{
    ElectionCfg, AMBIGUITY_BAND, CANDIDATE_ROUND_PLACES, CONFUSION_DIFF_SIGMAS, CONFUSION_TOP3_STD,
    INTENT_ROUND_PLACES, LOW_INTENT_CONFIDENCE, OOS_AS_NONE,
};
pub use elect::{elect_global, GlobalElection};
pub use error::ElectionError;
pub use model::{
    CandidatePrediction, Context, ContextScore, ElectionInput, ElectionResult, IncludedContexts,
    IntentCandidate, IntentLabel, Predictions, RawContextPrediction, RawIntent, Slot,
    GLOBAL_CONTEXT, NONE_LABEL,
};
pub use normalize::normalize_contexts;
pub use pipeline::run_election;
pub use slots::resolve_slots;
pub use stats::{all_in_range, round_half_away, standard_deviation, standard_normal_cdf};
