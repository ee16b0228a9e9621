use serde::Deserialize;

use crate::history::parse_trade_date;
use crate::model::PriceObservation;

/// Accept a JSON number or numeric string; anything else becomes `None`.
pub fn string_or_number_to_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
}

/// Body of `/api/historical/cm/equity`.
#[derive(Debug, Deserialize)]
pub struct NseEquityHistoryResponse {
    #[serde(default)]
    pub data: Vec<NseEquityHistoryRow>,
}

/// One daily row. Only the fields the estimator needs are decoded; both are
/// optional because the endpoint omits them on some suspended-trading days.
#[derive(Debug, Deserialize)]
pub struct NseEquityHistoryRow {
    #[serde(rename = "CH_TIMESTAMP", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "CH_SERIES", default)]
    pub series: Option<String>,
    #[serde(
        rename = "CH_CLOSING_PRICE",
        default,
        deserialize_with = "string_or_number_to_f64_opt"
    )]
    pub closing_price: Option<f64>,
}

impl NseEquityHistoryRow {
    /// `None` when the row lacks a parseable date or a positive close.
    pub fn to_observation(&self) -> Option<PriceObservation> {
        let date = parse_trade_date(self.timestamp.as_deref()?)?;
        let close = self.closing_price?;
        let obs = PriceObservation::new(date, close);
        obs.is_valid_price().then_some(obs)
    }

    pub fn matches_series(&self, series: &str) -> bool {
        self.series
            .as_deref()
            .map_or(true, |s| s.trim().eq_ignore_ascii_case(series))
    }
}
