use serde::{Deserialize, Serialize};

use crate::error::ElectionError;

/// OOS score at or above which a context gets a synthetic `none` candidate.
pub const OOS_AS_NONE: f64 = 0.4;
/// Top confidence below which the elector considers falling back to `none`.
pub const LOW_INTENT_CONFIDENCE: f64 = 0.4;
/// Half-width of the band around perfect confusion (`1/n`).
pub const AMBIGUITY_BAND: f64 = 0.1;
/// Top-2 gap, in standard deviations, above which candidates are not confused.
pub const CONFUSION_DIFF_SIGMAS: f64 = 2.5;
/// Max std of the best three confidences for them to count as really confused.
pub const CONFUSION_TOP3_STD: f64 = 0.03;
pub const INTENT_ROUND_PLACES: u32 = 2;
pub const CANDIDATE_ROUND_PLACES: u32 = 3;

const MAX_ROUND_PLACES: u32 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionCfg {
    pub oos_as_none: f64,
    pub low_intent_confidence: f64,
    pub ambiguity_band: f64,
    pub confusion_diff_sigmas: f64,
    pub confusion_top3_std: f64,
    /// Rounding applied to raw intent confidences before ranking.
    pub intent_round_places: u32,
    /// Rounding applied to globally weighted candidate confidences.
    pub candidate_round_places: u32,
}

impl Default for ElectionCfg {
    fn default() -> Self {
        Self {
            oos_as_none: OOS_AS_NONE,
            low_intent_confidence: LOW_INTENT_CONFIDENCE,
            ambiguity_band: AMBIGUITY_BAND,
            confusion_diff_sigmas: CONFUSION_DIFF_SIGMAS,
            confusion_top3_std: CONFUSION_TOP3_STD,
            intent_round_places: INTENT_ROUND_PLACES,
            candidate_round_places: CANDIDATE_ROUND_PLACES,
        }
    }
}

impl ElectionCfg {
    /// Parse a config from TOML. Missing keys fall back to the defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ElectionError> {
        let cfg: ElectionCfg = toml::from_str(toml_str).map_err(|e| ElectionError::InvalidConfig {
            field: "<toml>".to_string(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ElectionError> {
        let unit_fields = [
            ("oos_as_none", self.oos_as_none),
            ("low_intent_confidence", self.low_intent_confidence),
            ("ambiguity_band", self.ambiguity_band),
            ("confusion_top3_std", self.confusion_top3_std),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ElectionError::InvalidConfig {
                    field: field.to_string(),
                    message: "must be between 0.0 and 1.0".to_string(),
                });
            }
        }
        if !(self.confusion_diff_sigmas.is_finite() && self.confusion_diff_sigmas > 0.0) {
            return Err(ElectionError::InvalidConfig {
                field: "confusion_diff_sigmas".to_string(),
                message: "must be a positive number".to_string(),
            });
        }
        if self.confusion_top3_std <= 0.0 {
            return Err(ElectionError::InvalidConfig {
                field: "confusion_top3_std".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        for (field, places) in [
            ("intent_round_places", self.intent_round_places),
            ("candidate_round_places", self.candidate_round_places),
        ] {
            if places > MAX_ROUND_PLACES {
                return Err(ElectionError::InvalidConfig {
                    field: field.to_string(),
                    message: format!("must be at most {MAX_ROUND_PLACES}"),
                });
            }
        }
        Ok(())
    }
}
