pub mod csv_file;

pub use csv_file::CsvHistoryProvider;

use anyhow::Result;
use chrono::NaiveDate;

use crate::model::{DateRange, PriceObservation};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d-%b-%Y", "%d %b %Y"];

/// Parse the date spellings seen in NSE payloads and exported sheets.
/// A time suffix (`2024-01-02T00:00:00`) is ignored.
pub fn parse_trade_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let s = s.split(['T', ' ']).next().filter(|head| head.len() >= 8).unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Source of daily closes for one instrument. Implementations return
/// observations sorted by trade date; an empty vector means "no data" and is
/// left for the aggregator to reject.
pub trait PriceHistoryProvider {
    fn load_history(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceObservation>>;
}

impl<P: PriceHistoryProvider + ?Sized> PriceHistoryProvider for &P {
    fn load_history(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceObservation>> {
        (**self).load_history(symbol, range)
    }
}

impl<P: PriceHistoryProvider + ?Sized> PriceHistoryProvider for Box<P> {
    fn load_history(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceObservation>> {
        (**self).load_history(symbol, range)
    }
}

/// Sort by date and keep the last observation seen for each date.
pub fn normalize_observations(mut observations: Vec<PriceObservation>) -> Vec<PriceObservation> {
    observations.sort_by_key(|o| o.trade_date);
    let mut out: Vec<PriceObservation> = Vec::with_capacity(observations.len());
    for obs in observations {
        match out.last_mut() {
            Some(last) if last.trade_date == obs.trade_date => *last = obs,
            _ => out.push(obs),
        }
    }
    out
}
