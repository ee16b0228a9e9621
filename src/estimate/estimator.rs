use crate::error::EstimatorError;
use crate::model::{Direction, WeightedEstimate};
use crate::trim::TrimmedSeries;

use super::weights::{normalized_weights, WeightScheme};

/// Exponentially decayed estimate; shorthand for
/// [`estimate_with_scheme`] with [`WeightScheme::Exponential`].
pub fn estimate(series: &TrimmedSeries, decay: f64) -> Result<WeightedEstimate, EstimatorError> {
    estimate_with_scheme(series, WeightScheme::Exponential { decay })
}

pub fn estimate_with_scheme(
    series: &TrimmedSeries,
    scheme: WeightScheme,
) -> Result<WeightedEstimate, EstimatorError> {
    if series.is_empty() {
        return Err(EstimatorError::InvalidInput(
            "trimmed series is empty".to_string(),
        ));
    }
    let weights = normalized_weights(series.len(), scheme)?;

    let mut expected = 0.0;
    let mut weighted_up = 0.0;
    let mut weighted_down = 0.0;
    let mut max_upside: Option<f64> = None;
    let mut max_downside: Option<f64> = None;
    for (w, m) in weights.iter().zip(&series.entries) {
        let chg = m.pct_change;
        expected += w * chg;
        if m.is_up() {
            weighted_up += w;
            max_upside = Some(max_upside.map_or(chg, |v| v.max(chg)));
        } else if m.is_down() {
            weighted_down += w;
            max_downside = Some(max_downside.map_or(chg, |v| v.min(chg)));
        }
    }

    let total = weighted_up + weighted_down;
    let (prob_increase, prob_decrease) = if total > 0.0 {
        (weighted_up / total, weighted_down / total)
    } else {
        (0.0, 0.0)
    };

    // Strict comparison: an even split resolves to Decrease. Kept as-is,
    // the intended tie policy was never confirmed.
    let direction = if prob_increase > prob_decrease {
        Direction::Increase
    } else {
        Direction::Decrease
    };

    Ok(WeightedEstimate {
        prob_increase,
        prob_decrease,
        direction,
        direction_probability: prob_increase.max(prob_decrease),
        expected_pct_change: expected,
        max_upside,
        max_downside,
    })
}
