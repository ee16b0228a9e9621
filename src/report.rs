use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::analysis::InstrumentReport;
use crate::error::AppError;
use crate::model::MonthlyReturn;

pub const CSV_HEADER: [&str; 15] = [
    "Symbol",
    "Data Start",
    "Data End",
    "Anchor",
    "Probability Increase",
    "Probability Decrease",
    "Predicted Direction",
    "Probability of Direction",
    "Predicted % Change",
    "Weighted Volatility (Monthly %)",
    "Last Month Vol (%)",
    "Max Upside (trimmed)",
    "Max Downside (trimmed)",
    "Samples",
    "Removed",
];

fn opt_cell(v: Option<f64>) -> String {
    v.map(|x| format!("{:.6}", x)).unwrap_or_default()
}

pub fn report_row(r: &InstrumentReport) -> Vec<String> {
    let e = &r.estimate;
    vec![
        r.symbol.clone(),
        r.range.start.to_string(),
        r.range.end.to_string(),
        r.anchor.to_string(),
        format!("{:.6}", e.prob_increase),
        format!("{:.6}", e.prob_decrease),
        e.direction.to_string(),
        format!("{:.6}", e.direction_probability),
        format!("{:.6}", e.expected_pct_change),
        opt_cell(r.weighted_volatility_pct),
        opt_cell(r.last_month_volatility_pct),
        opt_cell(e.max_upside),
        opt_cell(e.max_downside),
        r.samples.to_string(),
        r.removed.to_string(),
    ]
}

pub fn write_csv<W: Write>(out: W, reports: &[InstrumentReport]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for r in reports {
        writer.write_record(report_row(r))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, reports: &[InstrumentReport]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(file, reports)
        .map_err(AppError::from)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = reports.len(), "Report written");
    Ok(())
}

fn pct_or_na(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}%", x)).unwrap_or_else(|| "n/a".to_string())
}

/// Console block for one instrument.
pub fn format_summary(r: &InstrumentReport) -> String {
    let e = &r.estimate;
    let mut s = String::new();
    s.push_str(&format!("--- {} Prediction ({}) ---\n", r.symbol, r.anchor));
    s.push_str(&format!(
        "Period: {} to {} | Samples: {} (removed {})\n",
        r.range.start, r.range.end, r.samples, r.removed
    ));
    s.push_str(&format!(
        "Probability Increase: {:.2}% | Decrease: {:.2}%\n",
        e.prob_increase * 100.0,
        e.prob_decrease * 100.0
    ));
    s.push_str(&format!(
        "Predicted Direction: {} ({:.2}%)\n",
        e.direction,
        e.direction_probability * 100.0
    ));
    s.push_str(&format!(
        "Predicted Mean % Change: {:.2}%\n",
        e.expected_pct_change
    ));
    if r.weighted_volatility_pct.is_some() || r.last_month_volatility_pct.is_some() {
        s.push_str(&format!(
            "Weighted Volatility: {} | Last Month Vol: {}\n",
            pct_or_na(r.weighted_volatility_pct),
            pct_or_na(r.last_month_volatility_pct)
        ));
    }
    s.push_str(&format!(
        "Max Upside: {} | Max Downside: {}\n",
        pct_or_na(e.max_upside),
        pct_or_na(e.max_downside)
    ));
    s
}

/// Month-over-month table: one line per month with its close date.
pub fn format_monthly_table(symbol: &str, monthly: &[MonthlyReturn]) -> String {
    let mut s = format!(
        "{:<10} {:<8} {:<12} {:>12} {:>10}\n",
        "Symbol", "Month", "TradeDate", "Close", "Change%"
    );
    for m in monthly {
        s.push_str(&format!(
            "{:<10} {:<8} {:<12} {:>12.2} {:>10.2}\n",
            symbol,
            m.year_month.to_string(),
            m.trade_date.to_string(),
            m.close_price,
            m.pct_change
        ));
    }
    s
}
