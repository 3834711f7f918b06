use tracing::{debug, warn};

use crate::error::ElectionError;
use crate::model::{ContextScore, IncludedContexts, Predictions};

/// Rescale raw context confidences by `min(1, Σ raw over included contexts)`.
///
/// Every context is rescaled (included or not); the elector filters later.
/// When the included sum is zero all contexts get weight 0.
pub fn normalize_contexts(
    predictions: &Predictions,
    included: &IncludedContexts,
) -> Result<Vec<ContextScore>, ElectionError> {
    for (context, p) in predictions {
        if !p.confidence.is_finite() {
            return Err(ElectionError::DegenerateInput {
                reason: format!("context {context} has non-finite confidence {}", p.confidence),
            });
        }
    }

    let included_sum: f64 = predictions
        .iter()
        .filter(|(context, _)| included.contains(*context))
        .map(|(_, p)| p.confidence)
        .sum();
    let total = included_sum.min(1.0);
    debug!(included_sum, total, contexts = predictions.len(), "normalizing context confidences");

    if total == 0.0 {
        warn!(
            contexts = predictions.len(),
            included = included.len(),
            "included context confidences sum to zero; all context weights set to 0"
        );
    }

    Ok(predictions
        .iter()
        .map(|(context, p)| ContextScore {
            context: context.clone(),
            raw: p.confidence,
            normalized: if total == 0.0 { 0.0 } else { p.confidence / total },
        })
        .collect())
}
