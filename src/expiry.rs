use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::YearMonth;

/// Last `weekday` of the given month, the date NSE uses for monthly
/// derivatives expiry (historically Thursday).
pub fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let mut day = YearMonth::new(year, month)?.last_day()?;
    while day.weekday() != weekday {
        day = day.pred_opt()?;
    }
    Some(day)
}

pub fn is_monthly_expiry(date: NaiveDate, weekday: Weekday) -> bool {
    last_weekday_of_month(date.year(), date.month(), weekday) == Some(date)
}

/// Expiry of the monthly cycle that `date` trades in: this month's expiry
/// when it has not passed yet, otherwise next month's.
pub fn expiry_for(date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let this_month = last_weekday_of_month(date.year(), date.month(), weekday)?;
    if date <= this_month {
        return Some(this_month);
    }
    let next = YearMonth::of(date).next();
    last_weekday_of_month(next.year, next.month, weekday)
}
