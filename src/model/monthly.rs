use std::fmt;

use chrono::{Datelike, NaiveDate};

/// Calendar month identifier. Field order makes the derived `Ord`
/// chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(self) -> Option<NaiveDate> {
        self.next().first_day().and_then(|d| d.pred_opt())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Month-over-month change of the representative close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyReturn {
    pub year_month: YearMonth,
    /// Date of the observation used as this month's close.
    pub trade_date: NaiveDate,
    pub close_price: f64,
    pub pct_change: f64,
}

impl MonthlyReturn {
    pub fn is_up(&self) -> bool {
        self.pct_change > 0.0
    }

    pub fn is_down(&self) -> bool {
        self.pct_change < 0.0
    }
}
