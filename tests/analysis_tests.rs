use std::collections::HashMap;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use monthly_outlook::analysis::{analyze, run_batch, AnalysisParams, SkipReason};
use monthly_outlook::estimate::{estimate_with_scheme, WeightScheme};
use monthly_outlook::history::PriceHistoryProvider;
use monthly_outlook::model::{DateRange, PriceObservation};
use monthly_outlook::monthly::{aggregate_monthly, MonthAnchor};
use monthly_outlook::trim::{trim, TrimPolicy};

struct MockProvider {
    series: HashMap<String, Vec<PriceObservation>>,
}

impl PriceHistoryProvider for MockProvider {
    fn load_history(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceObservation>> {
        match self.series.get(symbol) {
            Some(obs) => Ok(obs
                .iter()
                .copied()
                .filter(|o| range.contains(o.trade_date))
                .collect()),
            None => bail!("HTTP 503 for {}", symbol),
        }
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Two closes per month for 2023, drifting up with one sharp drop.
fn daily_closes() -> Vec<PriceObservation> {
    let month_end = [
        100.0, 103.0, 101.0, 106.0, 108.0, 80.0, 83.0, 85.0, 84.0, 88.0, 90.0, 93.0,
    ];
    let mut out = Vec::new();
    for (i, close) in month_end.iter().enumerate() {
        let m = i as u32 + 1;
        out.push(PriceObservation::new(d(2023, m, 10), close * 0.99));
        out.push(PriceObservation::new(d(2023, m, 20), close * 1.01));
        out.push(PriceObservation::new(d(2023, m, 27), *close));
    }
    out
}

fn range() -> DateRange {
    DateRange::new(d(2023, 1, 1), d(2023, 12, 31)).unwrap()
}

fn provider() -> MockProvider {
    let mut series = HashMap::new();
    series.insert("GOOD".to_string(), daily_closes());
    series.insert(
        "THIN".to_string(),
        vec![
            PriceObservation::new(d(2023, 5, 2), 10.0),
            PriceObservation::new(d(2023, 5, 3), 11.0),
        ],
    );
    MockProvider { series }
}

#[test]
fn analyze_matches_manual_pipeline() {
    let params = AnalysisParams::default();
    let report = analyze("GOOD", range(), &daily_closes(), &params).unwrap();

    let monthly = aggregate_monthly(&daily_closes()).unwrap();
    let trimmed = trim(&monthly, params.trim).unwrap();
    let expected = estimate_with_scheme(&trimmed, params.weights).unwrap();

    assert_eq!(report.estimate, expected);
    assert_eq!(report.samples, trimmed.len());
    assert_eq!(report.removed, trimmed.removed);
    assert_eq!(report.samples + report.removed, 11);
    assert!(report.removed >= 1, "the -25.9% month should be cut");
    assert!(report.weighted_volatility_pct.unwrap() > 0.0);
    assert!(report.last_month_volatility_pct.unwrap() > 0.0);
}

#[test]
/// Verifies volatility columns stay empty when disabled.
fn volatility_can_be_disabled() {
    let params = AnalysisParams {
        include_volatility: false,
        trim: TrimPolicy::FixedCount { k: 1 },
        weights: WeightScheme::Uniform,
        anchor: MonthAnchor::CalendarMonth,
    };
    let report = analyze("GOOD", range(), &daily_closes(), &params).unwrap();
    assert_eq!(report.weighted_volatility_pct, None);
    assert_eq!(report.last_month_volatility_pct, None);
    assert_eq!(report.samples, 9);
    assert_eq!(report.removed, 2);
}

#[test]
fn batch_skips_failures_and_continues() {
    let symbols: Vec<String> = ["MISSING", "GOOD", "THIN"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let outcome = run_batch(&provider(), &symbols, range(), &AnalysisParams::default());

    assert!(!outcome.is_empty());
    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports[0].symbol, "GOOD");

    assert_eq!(outcome.skipped.len(), 2);
    assert_eq!(outcome.skipped[0].symbol, "MISSING");
    assert!(matches!(outcome.skipped[0].reason, SkipReason::Fetch(_)));
    assert!(outcome.skipped[0].reason.to_string().contains("HTTP 503"));

    assert_eq!(outcome.skipped[1].symbol, "THIN");
    match &outcome.skipped[1].reason {
        SkipReason::Estimate(e) => assert!(e.is_insufficient_data()),
        other => panic!("unexpected reason: {}", other),
    }
}

#[test]
/// Verifies an all-failing batch reports empty.
fn batch_with_no_reports_is_empty() {
    let symbols = vec!["THIN".to_string()];
    let outcome = run_batch(&provider(), &symbols, range(), &AnalysisParams::default());
    assert!(outcome.is_empty());
    assert_eq!(outcome.skipped.len(), 1);
}
