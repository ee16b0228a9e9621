use std::collections::BTreeMap;

use crate::error::EstimatorError;
use crate::estimate::{normalized_weights, WeightScheme};
use crate::model::{PriceObservation, YearMonth};
use crate::monthly::MonthAnchor;
use crate::trim::TrimmedSeries;

/// Trading days per month used to scale daily volatility.
pub const TRADING_DAYS_PER_MONTH: f64 = 21.0;

/// Per-month realised volatility: sample standard deviation of daily log
/// returns inside the month, scaled by `sqrt(21)`. Returns are taken across
/// the whole series, so a month's first day is measured against the previous
/// month's last close. Months with fewer than two returns are absent.
pub fn monthly_volatility(
    observations: &[PriceObservation],
    anchor: MonthAnchor,
) -> Result<BTreeMap<YearMonth, f64>, EstimatorError> {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|o| o.trade_date);

    let mut returns: BTreeMap<YearMonth, Vec<f64>> = BTreeMap::new();
    for pair in sorted.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        if !prev.is_valid_price() || !cur.is_valid_price() {
            return Err(EstimatorError::InvalidInput(format!(
                "non-positive close around {}",
                cur.trade_date
            )));
        }
        let Some(ym) = anchor.bucket(cur.trade_date) else {
            continue;
        };
        returns
            .entry(ym)
            .or_default()
            .push((cur.close_price / prev.close_price).ln());
    }

    Ok(returns
        .into_iter()
        .filter_map(|(ym, r)| sample_std(&r).map(|sd| (ym, sd * TRADING_DAYS_PER_MONTH.sqrt())))
        .collect())
}

/// Volatility averaged with the same weights the estimator gives the
/// trimmed months. Months without a volatility are left out and the
/// remaining weights re-normalised.
pub fn weighted_volatility(
    trimmed: &TrimmedSeries,
    volatility: &BTreeMap<YearMonth, f64>,
    scheme: WeightScheme,
) -> Result<Option<f64>, EstimatorError> {
    let weights = normalized_weights(trimmed.len(), scheme)?;
    let mut sum = 0.0;
    let mut weight = 0.0;
    for (w, m) in weights.iter().zip(&trimmed.entries) {
        if let Some(v) = volatility.get(&m.year_month) {
            sum += w * v;
            weight += w;
        }
    }
    Ok((weight > 0.0).then(|| sum / weight))
}

pub fn last_month_volatility(
    trimmed: &TrimmedSeries,
    volatility: &BTreeMap<YearMonth, f64>,
) -> Option<f64> {
    trimmed
        .last()
        .and_then(|m| volatility.get(&m.year_month).copied())
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}
