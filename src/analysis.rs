use std::fmt;

use crate::error::EstimatorError;
use crate::estimate::{estimate_with_scheme, WeightScheme};
use crate::history::PriceHistoryProvider;
use crate::model::{DateRange, PriceObservation, WeightedEstimate};
use crate::monthly::{aggregate_monthly_with, MonthAnchor};
use crate::trim::{trim, TrimPolicy};
use crate::volatility::{last_month_volatility, monthly_volatility, weighted_volatility};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalysisParams {
    pub anchor: MonthAnchor,
    pub trim: TrimPolicy,
    pub weights: WeightScheme,
    pub include_volatility: bool,
}

/// Everything reported for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentReport {
    pub symbol: String,
    pub range: DateRange,
    pub anchor: MonthAnchor,
    pub estimate: WeightedEstimate,
    /// Months that went into the estimate.
    pub samples: usize,
    /// Months dropped by the outlier policy.
    pub removed: usize,
    /// Weighted monthly volatility, in percent.
    pub weighted_volatility_pct: Option<f64>,
    pub last_month_volatility_pct: Option<f64>,
}

/// Run the full chain for one instrument: aggregate, trim, weight.
pub fn analyze(
    symbol: &str,
    range: DateRange,
    observations: &[PriceObservation],
    params: &AnalysisParams,
) -> Result<InstrumentReport, EstimatorError> {
    let monthly = aggregate_monthly_with(observations, params.anchor)?;
    let trimmed = trim(&monthly, params.trim)?;
    let estimate = estimate_with_scheme(&trimmed, params.weights)?;

    let (weighted_vol, last_vol) = if params.include_volatility {
        let vols = monthly_volatility(observations, params.anchor)?;
        (
            weighted_volatility(&trimmed, &vols, params.weights)?,
            last_month_volatility(&trimmed, &vols),
        )
    } else {
        (None, None)
    };

    Ok(InstrumentReport {
        symbol: symbol.to_string(),
        range,
        anchor: params.anchor,
        estimate,
        samples: trimmed.len(),
        removed: trimmed.removed,
        weighted_volatility_pct: weighted_vol.map(|v| v * 100.0),
        last_month_volatility_pct: last_vol.map(|v| v * 100.0),
    })
}

#[derive(Debug)]
pub enum SkipReason {
    Fetch(anyhow::Error),
    Estimate(EstimatorError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Fetch(e) => write!(f, "fetch failed: {:#}", e),
            SkipReason::Estimate(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug)]
pub struct SkippedInstrument {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<InstrumentReport>,
    pub skipped: Vec<SkippedInstrument>,
}

impl BatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Analyse each symbol in turn. A failure only skips that symbol.
pub fn run_batch<P: PriceHistoryProvider>(
    provider: &P,
    symbols: &[String],
    range: DateRange,
    params: &AnalysisParams,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for symbol in symbols {
        let reason = match provider.load_history(symbol, &range) {
            Ok(observations) => match analyze(symbol, range, &observations, params) {
                Ok(report) => {
                    tracing::info!(
                        symbol = %symbol,
                        direction = %report.estimate.direction,
                        probability = report.estimate.direction_probability,
                        expected_pct = report.estimate.expected_pct_change,
                        samples = report.samples,
                        "Estimate ready"
                    );
                    outcome.reports.push(report);
                    continue;
                }
                Err(e) => SkipReason::Estimate(e),
            },
            Err(e) => SkipReason::Fetch(e),
        };
        tracing::warn!(symbol = %symbol, reason = %reason, "Skipping instrument");
        outcome.skipped.push(SkippedInstrument {
            symbol: symbol.clone(),
            reason,
        });
    }
    outcome
}
