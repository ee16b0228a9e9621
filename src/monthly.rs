use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, Weekday};

use crate::error::EstimatorError;
use crate::expiry::expiry_for;
use crate::model::{MonthlyReturn, PriceObservation, YearMonth};

/// How daily observations are bucketed into months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthAnchor {
    /// Calendar month; the month's close is its last trading day.
    #[default]
    CalendarMonth,
    /// Monthly derivatives cycle ending on the last `weekday` of each month.
    /// Days after an expiry roll into the following month's cycle.
    MonthlyExpiry { weekday: Weekday },
}

impl MonthAnchor {
    pub fn bucket(&self, date: NaiveDate) -> Option<YearMonth> {
        match self {
            MonthAnchor::CalendarMonth => Some(YearMonth::of(date)),
            MonthAnchor::MonthlyExpiry { weekday } => expiry_for(date, *weekday).map(YearMonth::of),
        }
    }
}

impl fmt::Display for MonthAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthAnchor::CalendarMonth => f.write_str("calendar"),
            MonthAnchor::MonthlyExpiry { weekday } => write!(f, "expiry({})", weekday),
        }
    }
}

/// Representative close per month, oldest month first. The latest trade date
/// inside a bucket wins regardless of input order.
pub fn monthly_closes(
    observations: &[PriceObservation],
    anchor: MonthAnchor,
) -> Result<Vec<(YearMonth, PriceObservation)>, EstimatorError> {
    let mut buckets: BTreeMap<YearMonth, PriceObservation> = BTreeMap::new();
    for obs in observations {
        if !obs.is_valid_price() {
            return Err(EstimatorError::InvalidInput(format!(
                "close price {} on {} is not a positive number",
                obs.close_price, obs.trade_date
            )));
        }
        let ym = anchor.bucket(obs.trade_date).ok_or_else(|| {
            EstimatorError::InvalidInput(format!("no month bucket for {}", obs.trade_date))
        })?;
        buckets
            .entry(ym)
            .and_modify(|cur| {
                if obs.trade_date >= cur.trade_date {
                    *cur = *obs;
                }
            })
            .or_insert(*obs);
    }
    Ok(buckets.into_iter().collect())
}

/// Calendar-month returns; see [`aggregate_monthly_with`].
pub fn aggregate_monthly(
    observations: &[PriceObservation],
) -> Result<Vec<MonthlyReturn>, EstimatorError> {
    aggregate_monthly_with(observations, MonthAnchor::CalendarMonth)
}

/// Percent change of each month's close against the previous month's close.
/// The first month only serves as a base and is not returned.
pub fn aggregate_monthly_with(
    observations: &[PriceObservation],
    anchor: MonthAnchor,
) -> Result<Vec<MonthlyReturn>, EstimatorError> {
    let closes = monthly_closes(observations, anchor)?;
    if closes.len() < 2 {
        return Err(EstimatorError::insufficient(
            "monthly aggregation",
            2,
            closes.len(),
        ));
    }

    Ok(closes
        .windows(2)
        .map(|pair| {
            let (_, prev) = pair[0];
            let (year_month, cur) = pair[1];
            MonthlyReturn {
                year_month,
                trade_date: cur.trade_date,
                close_price: cur.close_price,
                pct_change: (cur.close_price - prev.close_price) / prev.close_price * 100.0,
            }
        })
        .collect())
}
