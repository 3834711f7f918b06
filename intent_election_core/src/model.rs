//! Value types flowing through the election pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A classification scope (topic / domain).
pub type Context = String;

/// Context reported when the candidate list is empty.
pub const GLOBAL_CONTEXT: &str = "global";

/// Reserved wire label for "no intent / out of scope".
pub const NONE_LABEL: &str = "none";

/// Intent label. The reserved `"none"` string only exists at the serde boundary;
/// inside the pipeline it is always [`IntentLabel::NoIntent`].
///
/// `Named` must never hold `"none"`: build labels through [`IntentLabel::named`]
/// or `From<String>`, which map the reserved string to `NoIntent`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentLabel {
    NoIntent,
    Named(String),
}

impl IntentLabel {
    pub fn named(label: impl Into<String>) -> Self {
        Self::from(label.into())
    }

    pub fn is_no_intent(&self) -> bool {
        matches!(self, IntentLabel::NoIntent)
    }

    pub fn as_str(&self) -> &str {
        match self {
            IntentLabel::NoIntent => NONE_LABEL,
            IntentLabel::Named(s) => s,
        }
    }
}

impl From<String> for IntentLabel {
    fn from(s: String) -> Self {
        if s == NONE_LABEL {
            IntentLabel::NoIntent
        } else {
            IntentLabel::Named(s)
        }
    }
}

impl From<&str> for IntentLabel {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<IntentLabel> for String {
    fn from(label: IntentLabel) -> Self {
        match label {
            IntentLabel::NoIntent => NONE_LABEL.to_string(),
            IntentLabel::Named(s) => s,
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slot extracted alongside an intent. Only passed through: `name` is
/// optional and every other field is preserved untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Slot {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// One intent as emitted by a context's classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawIntent {
    pub label: IntentLabel,
    pub confidence: f64,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl RawIntent {
    pub fn new(label: impl Into<IntentLabel>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
            slots: Vec::new(),
        }
    }

    pub fn with_slots(mut self, slots: Vec<Slot>) -> Self {
        self.slots = slots;
        self
    }
}

/// Raw output of one context's classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawContextPrediction {
    pub confidence: f64,
    #[serde(default)]
    pub intents: Vec<RawIntent>,
    #[serde(default)]
    pub oos: f64,
}

/// Per-context predictions, iterated in context-name order.
pub type Predictions = BTreeMap<Context, RawContextPrediction>;

/// Contexts eligible for election.
pub type IncludedContexts = BTreeSet<Context>;

/// Everything one election needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionInput {
    pub predictions: Predictions,
    pub included_contexts: IncludedContexts,
}

impl ElectionInput {
    pub fn new(predictions: Predictions, included_contexts: IncludedContexts) -> Self {
        Self {
            predictions,
            included_contexts,
        }
    }

    /// Every context present in `predictions` is eligible.
    pub fn include_all(predictions: Predictions) -> Self {
        let included_contexts = predictions.keys().cloned().collect();
        Self::new(predictions, included_contexts)
    }

    pub fn oos(&self, context: &str) -> Option<f64> {
        self.predictions.get(context).map(|p| p.oos)
    }
}

/// A context's confidence after renormalization over the included contexts.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextScore {
    pub context: Context,
    pub raw: f64,
    pub normalized: f64,
}

/// A rounded, context-local candidate considered by the aggregator.
#[derive(Clone, Debug, PartialEq)]
pub struct IntentCandidate {
    pub label: IntentLabel,
    pub confidence: f64,
}

/// A globally comparable candidate produced by election.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidatePrediction {
    pub name: IntentLabel,
    pub context: Context,
    pub confidence: f64,
}

impl CandidatePrediction {
    pub fn new(name: IntentLabel, context: impl Into<Context>, confidence: f64) -> Self {
        debug_assert!(
            !matches!(&name, IntentLabel::Named(s) if s == NONE_LABEL),
            "Named label holds the reserved \"{NONE_LABEL}\"; use IntentLabel::named"
        );
        Self {
            name,
            context: context.into(),
            confidence,
        }
    }
}

/// Final output of one election.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectionResult {
    pub intent: Option<CandidatePrediction>,
    pub intents: Vec<CandidatePrediction>,
    pub ambiguous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<Slot>>,
}

impl ElectionResult {
    pub fn elected_name(&self) -> Option<&IntentLabel> {
        self.intent.as_ref().map(|c| &c.name)
    }
}
