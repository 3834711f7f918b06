//! Domain adapter layer: turn upstream classifier output into `ElectionInput`.
//!
//! Small and policy-light:
//! - No IO
//! - No async
//! - No election rules (those live in core)
//!
//! Products provide an `InputBuilder` (or use `BasicInputBuilder`) to map
//! `UtteranceEvent`s into election inputs.

use serde::{Deserialize, Serialize};

use intent_election_core::{ElectionError, ElectionInput, IncludedContexts, Predictions};

/// One utterance's predictions as delivered by the classification stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtteranceEvent {
    pub utterance_id: String,
    /// Tally key (bot, channel, tenant...). Defaults to empty.
    #[serde(default)]
    pub stream_id: String,
    pub predictions: Predictions,
    #[serde(default)]
    pub included_contexts: IncludedContexts,
}

impl UtteranceEvent {
    pub fn new(utterance_id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self {
            utterance_id: utterance_id.into(),
            stream_id: stream_id.into(),
            predictions: Predictions::new(),
            included_contexts: IncludedContexts::new(),
        }
    }

    pub fn with_predictions(mut self, predictions: Predictions) -> Self {
        self.predictions = predictions;
        self
    }

    pub fn with_included(mut self, included: IncludedContexts) -> Self {
        self.included_contexts = included;
        self
    }
}

/// Confidence checks applied before election.
///
/// Non-finite scores are always rejected. Scores outside [0, 1] are clamped
/// when `clamp_unit` is set, rejected otherwise.
#[derive(Clone, Copy, Debug)]
pub struct ScoreSanitizer {
    pub clamp_unit: bool,
}

impl Default for ScoreSanitizer {
    fn default() -> Self {
        Self { clamp_unit: true }
    }
}

impl ScoreSanitizer {
    pub fn check(&self, what: &str, value: f64) -> Result<f64, ElectionError> {
        if !value.is_finite() {
            return Err(ElectionError::DegenerateInput {
                reason: format!("{what} is not finite: {value}"),
            });
        }
        if (0.0..=1.0).contains(&value) {
            return Ok(value);
        }
        if self.clamp_unit {
            Ok(value.clamp(0.0, 1.0))
        } else {
            Err(ElectionError::InvalidInput {
                reason: format!("{what} outside [0, 1]: {value}"),
            })
        }
    }

    pub fn sanitize(&self, predictions: &Predictions) -> Result<Predictions, ElectionError> {
        let mut out = predictions.clone();
        for (context, p) in out.iter_mut() {
            p.confidence = self.check(&format!("context {context} confidence"), p.confidence)?;
            p.oos = self.check(&format!("context {context} oos"), p.oos)?;
            for intent in p.intents.iter_mut() {
                intent.confidence = self.check(
                    &format!("intent {} confidence in {context}", intent.label),
                    intent.confidence,
                )?;
            }
        }
        Ok(out)
    }
}

/// Map an `UtteranceEvent` to the core election input.
pub trait InputBuilder {
    fn build(&self, ev: &UtteranceEvent) -> Result<ElectionInput, ElectionError>;
}

/// Sanitizes scores and keeps only included contexts that actually have predictions.
#[derive(Clone, Debug, Default)]
pub struct BasicInputBuilder {
    pub sanitizer: ScoreSanitizer,
}

impl InputBuilder for BasicInputBuilder {
    fn build(&self, ev: &UtteranceEvent) -> Result<ElectionInput, ElectionError> {
        let predictions = self.sanitizer.sanitize(&ev.predictions)?;
        let included = ev
            .included_contexts
            .iter()
            .filter(|c| predictions.contains_key(*c))
            .cloned()
            .collect();
        Ok(ElectionInput::new(predictions, included))
    }
}

/// Build inputs for a batch of events, one result per event.
pub fn build_input_batch<B: InputBuilder>(
    builder: &B,
    events: &[UtteranceEvent],
) -> Vec<Result<ElectionInput, ElectionError>> {
    events.iter().map(|ev| builder.build(ev)).collect()
}
