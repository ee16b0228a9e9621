use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::StatusCode;

use crate::config::NseConfig;
use crate::error::AppError;
use crate::history::{normalize_observations, PriceHistoryProvider};
use crate::model::{DateRange, PriceObservation};

use super::types::{NseEquityHistoryResponse, NseEquityHistoryRow};

const HISTORY_DATE_FMT: &str = "%d-%m-%Y";

/// Blocking client for the NSE historical equity endpoint. The site only
/// answers API calls that carry cookies from a prior page visit, so the first
/// request bootstraps a session against the home page.
pub struct NseRestClient {
    http: Client,
    base_url: String,
    series: String,
    chunk_days: u32,
    max_retries: u32,
    retry_sleep: Duration,
    session_ready: AtomicBool,
}

impl NseRestClient {
    pub fn new(cfg: &NseConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&cfg.user_agent).context("nse.user_agent is not a valid header")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        let referer = format!("{}/", cfg.base_url.trim_end_matches('/'));
        headers.insert(
            REFERER,
            HeaderValue::from_str(&referer).context("nse.base_url is not a valid header")?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(AppError::from)
            .context("failed to build NSE HTTP client")?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            series: cfg.series.trim().to_ascii_uppercase(),
            chunk_days: cfg.chunk_days.max(1),
            max_retries: cfg.max_retries.max(1),
            retry_sleep: Duration::from_millis(cfg.retry_sleep_ms),
            session_ready: AtomicBool::new(false),
        })
    }

    fn bootstrap_session(&self) {
        let url = format!("{}/", self.base_url);
        match self.http.get(&url).send() {
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "NSE session bootstrap");
                self.session_ready.store(true, Ordering::Relaxed);
            }
            Err(e) => tracing::warn!(error = %e, "NSE session bootstrap failed"),
        }
    }

    fn fetch_window(&self, symbol: &str, window: &DateRange) -> Result<Vec<NseEquityHistoryRow>> {
        if !self.session_ready.load(Ordering::Relaxed) {
            self.bootstrap_session();
        }

        let endpoint = format!("{}/api/historical/cm/equity", self.base_url);
        let series = format!("[\"{}\"]", self.series);
        let from = window.start.format(HISTORY_DATE_FMT).to_string();
        let to = window.end.format(HISTORY_DATE_FMT).to_string();

        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 1..=self.max_retries {
            let sent = self
                .http
                .get(&endpoint)
                .query(&[
                    ("symbol", symbol),
                    ("series", series.as_str()),
                    ("from", from.as_str()),
                    ("to", to.as_str()),
                ])
                .send();

            match sent {
                Ok(resp) if resp.status().is_success() => {
                    let body: NseEquityHistoryResponse = resp
                        .json()
                        .map_err(AppError::from)
                        .context("NSE equity history JSON parse failed")?;
                    return Ok(body.data);
                }
                Ok(resp) => {
                    let status = resp.status();
                    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                        self.session_ready.store(false, Ordering::Relaxed);
                    }
                    last_err = Some(
                        AppError::NseApi {
                            status: status.as_u16(),
                            url: resp.url().to_string(),
                        }
                        .into(),
                    );
                }
                Err(e) => last_err = Some(AppError::from(e).into()),
            }

            tracing::debug!(symbol, attempt, from = %from, to = %to, "NSE history request failed");
            if attempt < self.max_retries {
                std::thread::sleep(self.retry_sleep);
                if !self.session_ready.load(Ordering::Relaxed) {
                    self.bootstrap_session();
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| anyhow::anyhow!("no NSE request attempted"))
            .context(format!(
                "NSE history for {} {}..{} failed after {} attempts",
                symbol, from, to, self.max_retries
            )))
    }

    pub fn fetch_history(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceObservation>> {
        let symbol = symbol.trim().to_ascii_uppercase();
        let mut observations = Vec::new();
        let mut dropped = 0usize;
        for window in history_windows(range, self.chunk_days) {
            for row in self.fetch_window(&symbol, &window)? {
                if !row.matches_series(&self.series) {
                    continue;
                }
                match row.to_observation() {
                    Some(obs) if range.contains(obs.trade_date) => observations.push(obs),
                    Some(_) => {}
                    None => dropped += 1,
                }
            }
        }
        if dropped > 0 {
            tracing::debug!(symbol = %symbol, dropped, "Dropped NSE rows without date or close");
        }
        let observations = normalize_observations(observations);
        tracing::info!(symbol = %symbol, count = observations.len(), "Fetched NSE price history");
        Ok(observations)
    }
}

impl PriceHistoryProvider for NseRestClient {
    fn load_history(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceObservation>> {
        self.fetch_history(symbol, range)
    }
}

/// Consecutive, non-overlapping windows of at most `chunk_days` days that
/// exactly cover `range`.
pub fn history_windows(range: &DateRange, chunk_days: u32) -> Vec<DateRange> {
    let span = u64::from(chunk_days.max(1));
    let mut out = Vec::new();
    let mut start: NaiveDate = range.start;
    while start <= range.end {
        let end = start
            .checked_add_days(Days::new(span - 1))
            .map_or(range.end, |d| d.min(range.end));
        out.push(DateRange { start, end });
        match end.succ_opt() {
            Some(next) => start = next,
            None => break,
        }
    }
    out
}
