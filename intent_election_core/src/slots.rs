use crate::error::ElectionError;
use crate::model::{CandidatePrediction, Predictions, Slot};

/// Slots originally predicted for `elected` in its own context.
pub fn resolve_slots(
    elected: &CandidatePrediction,
    predictions: &Predictions,
) -> Result<Vec<Slot>, ElectionError> {
    predictions
        .get(&elected.context)
        .and_then(|p| p.intents.iter().find(|i| i.label == elected.name))
        .map(|i| i.slots.clone())
        .ok_or_else(|| ElectionError::NotFound {
            context: elected.context.clone(),
            label: elected.name.to_string(),
        })
}
