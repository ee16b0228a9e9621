use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::error::AppError;
use crate::model::{DateRange, PriceObservation};

use super::{normalize_observations, parse_trade_date, PriceHistoryProvider};

const DATE_COLUMNS: [&str; 4] = ["date", "DATE", "CH_TIMESTAMP", "TIMESTAMP"];
const CLOSE_COLUMNS: [&str; 3] = ["close", "CLOSE", "CH_CLOSING_PRICE"];

/// Offline provider reading `{dir}/{SYMBOL}.csv` exports.
#[derive(Debug, Clone)]
pub struct CsvHistoryProvider {
    dir: PathBuf,
}

impl CsvHistoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir
            .join(format!("{}.csv", symbol.trim().to_ascii_uppercase()))
    }
}

impl PriceHistoryProvider for CsvHistoryProvider {
    fn load_history(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceObservation>> {
        let path = self.path_for(symbol);
        let text = std::fs::read_to_string(&path)
            .map_err(AppError::from)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let all = parse_history_csv(&text).with_context(|| format!("in {}", path.display()))?;
        let in_range: Vec<PriceObservation> = all
            .into_iter()
            .filter(|o| range.contains(o.trade_date))
            .collect();
        tracing::debug!(symbol, rows = in_range.len(), path = %path.display(), "Loaded CSV history");
        Ok(normalize_observations(in_range))
    }
}

/// Parse a CSV export with a header row. Rows whose date or close cannot be
/// read are skipped.
pub fn parse_history_csv(text: &str) -> Result<Vec<PriceObservation>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(AppError::from)
        .context("failed to read CSV header")?
        .clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let date_idx = find_column(&headers, &DATE_COLUMNS);
    let close_idx = find_column(&headers, &CLOSE_COLUMNS);
    let (Some(date_idx), Some(close_idx)) = (date_idx, close_idx) else {
        bail!(
            "could not locate date/close columns in header {:?}",
            headers.iter().collect::<Vec<_>>()
        );
    };

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let Ok(record) = record else {
            skipped += 1;
            continue;
        };
        let date = record.get(date_idx).and_then(parse_trade_date);
        let close = record
            .get(close_idx)
            .and_then(|s| s.replace(',', "").parse::<f64>().ok());
        match (date, close) {
            (Some(d), Some(c)) => out.push(PriceObservation::new(d, c)),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "Skipped unreadable CSV rows");
    }
    Ok(out)
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    let name = |h: &str| h.trim_start_matches('\u{feff}').trim().to_string();
    candidates
        .iter()
        .find_map(|c| headers.iter().position(|h| name(h) == *c))
        .or_else(|| {
            candidates
                .iter()
                .find_map(|c| headers.iter().position(|h| name(h).eq_ignore_ascii_case(c)))
        })
}
