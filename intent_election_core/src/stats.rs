//! Small numeric helpers shared by the aggregator and the ambiguity detector.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::ElectionError;

/// Population standard deviation.
pub fn standard_deviation(values: &[f64]) -> Result<f64, ElectionError> {
    if values.is_empty() {
        return Err(ElectionError::InvalidInput {
            reason: "standard deviation of an empty sequence".to_string(),
        });
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Ok(variance.sqrt())
}

/// Φ(z) for the standard normal distribution. NaN in, NaN out.
pub fn standard_normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(z),
        Err(_) => f64::NAN,
    }
}

/// True when every value lies in `[low, high]` (inclusive). Vacuously true when empty.
pub fn all_in_range(values: &[f64], low: f64, high: f64) -> bool {
    values.iter().all(|v| *v >= low && *v <= high)
}

/// Round half away from zero at `places` decimals.
///
/// Works on the shortest decimal representation of `value`, so `1.005`
/// rounds to `1.01` rather than the binary-float `1.00`.
pub fn round_half_away(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .and_then(|d| {
            d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
                .to_f64()
        })
        .unwrap_or_else(|| {
            // Outside Decimal's range/precision: fall back to float scaling.
            let scale = 10f64.powi(places as i32);
            (value * scale).round() / scale
        })
}
