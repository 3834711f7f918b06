//! Per-context aggregation: merge intents with the OOS score, then split the
//! context's weight between its top two candidates.
//!
//! Confidence ratios are treated as log-normally distributed: the gap between
//! the top two log-confidences, measured in standard deviations of all
//! log-confidences, goes through Φ to give the share of the first candidate.

use std::cmp::Ordering;

use tracing::debug;

use crate::cfg::ElectionCfg;
use crate::error::ElectionError;
use crate::model::{
    CandidatePrediction, ContextScore, IntentCandidate, IntentLabel, Predictions,
    RawContextPrediction,
};
use crate::stats::{round_half_away, standard_deviation, standard_normal_cdf};

/// Rounded candidates for one context, best first. Appends a synthetic
/// `none` candidate when the OOS score reaches `cfg.oos_as_none`.
pub fn candidates_for_context(
    context: &str,
    prediction: &RawContextPrediction,
    cfg: &ElectionCfg,
) -> Result<Vec<IntentCandidate>, ElectionError> {
    if !prediction.oos.is_finite() {
        return Err(ElectionError::DegenerateInput {
            reason: format!("context {context} has non-finite oos {}", prediction.oos),
        });
    }

    let mut candidates = Vec::with_capacity(prediction.intents.len() + 1);
    for intent in &prediction.intents {
        if !intent.confidence.is_finite() {
            return Err(ElectionError::DegenerateInput {
                reason: format!(
                    "intent {} in context {context} has non-finite confidence {}",
                    intent.label, intent.confidence
                ),
            });
        }
        candidates.push(IntentCandidate {
            label: intent.label.clone(),
            confidence: round_half_away(intent.confidence, cfg.intent_round_places),
        });
    }
    if prediction.oos >= cfg.oos_as_none {
        candidates.push(IntentCandidate {
            label: IntentLabel::NoIntent,
            confidence: round_half_away(prediction.oos, cfg.intent_round_places),
        });
    }

    candidates.sort_by(|a, b| desc(a.confidence, b.confidence));
    Ok(candidates)
}

/// The three best candidates are statistically indistinguishable.
///
/// Expects `candidates` sorted best first.
pub fn predictions_really_confused(
    candidates: &[IntentCandidate],
    cfg: &ElectionCfg,
) -> Result<bool, ElectionError> {
    if candidates.len() <= 2 {
        return Ok(false);
    }

    let confidences: Vec<f64> = candidates.iter().map(|c| c.confidence).collect();
    let std = standard_deviation(&confidences)?;
    let diff = (confidences[0] - confidences[1]) / std;
    if diff >= cfg.confusion_diff_sigmas {
        return Ok(false);
    }

    let best_of_3_std = standard_deviation(&confidences[..3])?;
    Ok(best_of_3_std <= cfg.confusion_top3_std)
}

/// Emit one or two globally weighted candidates for a single context.
pub fn aggregate_context(
    score: &ContextScore,
    prediction: &RawContextPrediction,
    cfg: &ElectionCfg,
) -> Result<Vec<CandidatePrediction>, ElectionError> {
    let context = score.context.as_str();
    if prediction.intents.is_empty() {
        debug!(context, "context has no intents; no candidates emitted");
        return Ok(Vec::new());
    }

    let mut candidates = candidates_for_context(context, prediction, cfg)?;

    if candidates[0].confidence == 1.0 || candidates.len() == 1 {
        return Ok(vec![CandidatePrediction::new(
            candidates[0].label.clone(),
            context,
            1.0,
        )]);
    }

    // Shifts every rank by one: the previous best becomes the runner-up.
    if predictions_really_confused(&candidates, cfg)? {
        debug!(context, "top candidates really confused; prepending none");
        candidates.insert(
            0,
            IntentCandidate {
                label: IntentLabel::NoIntent,
                confidence: 1.0,
            },
        );
    }

    let logs: Vec<f64> = candidates
        .iter()
        .filter(|c| c.confidence != 0.0)
        .map(|c| c.confidence.ln())
        .collect();
    // Every candidate rounded to 0: no log spread, so p1 falls back to 0.5 below.
    let lnstd = if logs.is_empty() {
        f64::NAN
    } else {
        standard_deviation(&logs)?
    };

    let z = (candidates[0].confidence.ln() - candidates[1].confidence.ln()) / lnstd;
    let mut p1 = standard_normal_cdf(z);
    if p1.is_nan() {
        p1 = 0.5;
    }

    let ctx_conf = score.normalized;
    let first = CandidatePrediction::new(
        candidates[0].label.clone(),
        context,
        round_half_away(ctx_conf * p1, cfg.candidate_round_places),
    );
    let second = CandidatePrediction::new(
        candidates[1].label.clone(),
        context,
        round_half_away(ctx_conf * (1.0 - p1), cfg.candidate_round_places),
    );
    debug!(
        context,
        ctx_conf,
        p1,
        first = %first.name,
        second = %second.name,
        "context weight split"
    );
    Ok(vec![first, second])
}

/// Flat list of emissions from every scored context, in context order.
pub fn aggregate_all(
    scores: &[ContextScore],
    predictions: &Predictions,
    cfg: &ElectionCfg,
) -> Result<Vec<CandidatePrediction>, ElectionError> {
    let mut out = Vec::new();
    for score in scores {
        if let Some(prediction) = predictions.get(&score.context) {
            out.extend(aggregate_context(score, prediction, cfg)?);
        }
    }
    Ok(out)
}

pub(crate) fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
