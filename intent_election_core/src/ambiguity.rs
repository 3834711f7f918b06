use crate::cfg::ElectionCfg;
use crate::model::CandidatePrediction;
use crate::stats::all_in_range;

/// The confidence distribution is too close to uniform to be decisive.
///
/// Every confidence within `1/n ± band`, or every confidence after a leading
/// `none` within that band.
pub fn detect_ambiguity(intents: &[CandidatePrediction], cfg: &ElectionCfg) -> bool {
    let n = intents.len();
    if n <= 1 {
        return false;
    }

    let perfect = 1.0 / n as f64;
    let low = perfect - cfg.ambiguity_band;
    let high = perfect + cfg.ambiguity_band;
    let confidences: Vec<f64> = intents.iter().map(|c| c.confidence).collect();

    all_in_range(&confidences, low, high)
        || (intents[0].name.is_no_intent() && all_in_range(&confidences[1..], low, high))
}
