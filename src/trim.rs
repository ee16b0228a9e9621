use crate::error::EstimatorError;
use crate::model::MonthlyReturn;

pub const DEFAULT_IQR_K: f64 = 1.5;
pub const DEFAULT_MIN_RETAINED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrimPolicy {
    /// Drop the `k` lowest and `k` highest months by `pct_change`.
    FixedCount { k: usize },
    /// Keep months inside `[Q1 - k*IQR, Q3 + k*IQR]`.
    Iqr { k: f64, min_retained: usize },
}

impl TrimPolicy {
    pub fn iqr(k: f64) -> Self {
        TrimPolicy::Iqr {
            k,
            min_retained: DEFAULT_MIN_RETAINED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrimPolicy::FixedCount { .. } => "fixed",
            TrimPolicy::Iqr { .. } => "iqr",
        }
    }
}

impl Default for TrimPolicy {
    fn default() -> Self {
        TrimPolicy::iqr(DEFAULT_IQR_K)
    }
}

/// Monthly returns that survived outlier removal, still oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedSeries {
    pub entries: Vec<MonthlyReturn>,
    pub removed: usize,
}

impl TrimmedSeries {
    /// Wraps a series without removing anything.
    pub fn untrimmed(entries: Vec<MonthlyReturn>) -> Self {
        Self {
            entries,
            removed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&MonthlyReturn> {
        self.entries.last()
    }
}

pub fn trim(series: &[MonthlyReturn], policy: TrimPolicy) -> Result<TrimmedSeries, EstimatorError> {
    match policy {
        TrimPolicy::FixedCount { k } => trim_fixed_count(series, k),
        TrimPolicy::Iqr { k, min_retained } => trim_iqr(series, k, min_retained),
    }
}

fn trim_fixed_count(series: &[MonthlyReturn], k: usize) -> Result<TrimmedSeries, EstimatorError> {
    let n = series.len();
    let dropped = k.saturating_mul(2);
    if n <= dropped {
        return Err(EstimatorError::insufficient(
            "fixed-count trim",
            dropped.saturating_add(1),
            n,
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    // Stable sort: equal changes keep chronological order.
    order.sort_by(|&a, &b| series[a].pct_change.total_cmp(&series[b].pct_change));

    let mut keep = vec![false; n];
    for &idx in &order[k..n - k] {
        keep[idx] = true;
    }

    let entries: Vec<MonthlyReturn> = series
        .iter()
        .zip(keep)
        .filter_map(|(m, kept)| kept.then_some(*m))
        .collect();
    Ok(TrimmedSeries {
        removed: n - entries.len(),
        entries,
    })
}

fn trim_iqr(
    series: &[MonthlyReturn],
    k: f64,
    min_retained: usize,
) -> Result<TrimmedSeries, EstimatorError> {
    if !k.is_finite() || k <= 0.0 {
        return Err(EstimatorError::InvalidInput(format!(
            "IQR multiplier must be a positive number, got {}",
            k
        )));
    }
    let (lower, upper) = iqr_bounds(series, k)
        .ok_or_else(|| EstimatorError::insufficient("IQR trim", min_retained.max(1), 0))?;

    let entries: Vec<MonthlyReturn> = series
        .iter()
        .filter(|m| m.pct_change >= lower && m.pct_change <= upper)
        .copied()
        .collect();
    if entries.len() < min_retained.max(1) {
        return Err(EstimatorError::insufficient(
            "IQR trim",
            min_retained.max(1),
            entries.len(),
        ));
    }
    Ok(TrimmedSeries {
        removed: series.len() - entries.len(),
        entries,
    })
}

/// Inclusive `[Q1 - k*IQR, Q3 + k*IQR]` over `pct_change`; `None` for an
/// empty series.
pub fn iqr_bounds(series: &[MonthlyReturn], k: f64) -> Option<(f64, f64)> {
    let values: Vec<f64> = series.iter().map(|m| m.pct_change).collect();
    let q1 = quantile(&values, 0.25)?;
    let q3 = quantile(&values, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - k * iqr, q3 + k * iqr))
}

/// Quantile with linear interpolation between closest ranks, position
/// `q * (n - 1)` in the ascending values.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
