use chrono::{Months, NaiveDate};

/// One daily close as delivered by a price-history provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub trade_date: NaiveDate,
    pub close_price: f64,
}

impl PriceObservation {
    pub fn new(trade_date: NaiveDate, close_price: f64) -> Self {
        Self {
            trade_date,
            close_price,
        }
    }

    pub fn is_valid_price(&self) -> bool {
        self.close_price.is_finite() && self.close_price > 0.0
    }
}

/// Inclusive calendar range requested from a provider and echoed in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Range covering the `months` calendar months that end on `end`.
    pub fn trailing_months(end: NaiveDate, months: u32) -> Self {
        let start = end.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}
