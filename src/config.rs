use anyhow::{bail, Context, Result};
use chrono::Weekday;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analysis::AnalysisParams;
use crate::error::AppError;
use crate::estimate::WeightScheme;
use crate::monthly::MonthAnchor;
use crate::trim::{TrimPolicy, DEFAULT_IQR_K, DEFAULT_MIN_RETAINED};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub nse: NseConfig,
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NseConfig {
    pub base_url: String,
    pub series: String,
    pub chunk_days: u32,
    pub max_retries: u32,
    pub retry_sleep_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NseConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.nseindia.com".to_string(),
            series: "EQ".to_string(),
            chunk_days: 40,
            max_retries: 3,
            retry_sleep_ms: 1_000,
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub symbols: Vec<String>,
    #[serde(default = "default_lookback_months")]
    pub lookback_months: u32,
    #[serde(default = "default_anchor")]
    pub anchor: String,
    #[serde(default = "default_expiry_weekday")]
    pub expiry_weekday: String,
    #[serde(default)]
    pub trim: TrimConfig,
    #[serde(default)]
    pub weighting: WeightingConfig,
    #[serde(default = "default_true")]
    pub volatility: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    pub policy: String,
    /// Signed so a negative value in the file is reported, not a parse error.
    pub remove_extremes: i64,
    pub iqr_k: f64,
    pub min_retained: usize,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            policy: "iqr".to_string(),
            remove_extremes: 1,
            iqr_k: DEFAULT_IQR_K,
            min_retained: DEFAULT_MIN_RETAINED,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    pub scheme: String,
    pub decay: f64,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            scheme: "exp".to_string(),
            decay: 0.85,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: PathBuf,
    /// Offline CSV directory; when set, NSE is not contacted.
    pub data_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("reports/monthly_outlook.csv"),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn default_lookback_months() -> u32 {
    24
}

fn default_anchor() -> String {
    "calendar".to_string()
}

fn default_expiry_weekday() -> String {
    "thu".to_string()
}

fn default_true() -> bool {
    true
}

/// Parse a weekday name such as "thu" or "Tuesday".
pub fn parse_weekday(s: &str) -> Result<Weekday> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| anyhow::anyhow!("invalid weekday '{}'", s))
}

impl AnalysisConfig {
    /// Normalised, de-duplicated symbol list in configured order.
    pub fn symbol_list(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for sym in &self.symbols {
            let s = sym.trim().to_ascii_uppercase();
            if !s.is_empty() && !out.contains(&s) {
                out.push(s);
            }
        }
        out
    }

    pub fn month_anchor(&self) -> Result<MonthAnchor> {
        match self.anchor.trim().to_ascii_lowercase().as_str() {
            "calendar" | "month" => Ok(MonthAnchor::CalendarMonth),
            "expiry" => Ok(MonthAnchor::MonthlyExpiry {
                weekday: parse_weekday(&self.expiry_weekday)?,
            }),
            other => bail!(
                "invalid anchor '{}': expected 'calendar' or 'expiry'",
                other
            ),
        }
    }

    pub fn trim_policy(&self) -> Result<TrimPolicy> {
        match self.trim.policy.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixed-count" => {
                if self.trim.remove_extremes < 0 {
                    bail!(
                        "trim.remove_extremes must be >= 0, got {}",
                        self.trim.remove_extremes
                    );
                }
                Ok(TrimPolicy::FixedCount {
                    k: self.trim.remove_extremes as usize,
                })
            }
            "iqr" => {
                if !self.trim.iqr_k.is_finite() || self.trim.iqr_k <= 0.0 {
                    bail!("trim.iqr_k must be > 0, got {}", self.trim.iqr_k);
                }
                Ok(TrimPolicy::Iqr {
                    k: self.trim.iqr_k,
                    min_retained: self.trim.min_retained.max(1),
                })
            }
            other => bail!("invalid trim.policy '{}': expected 'fixed' or 'iqr'", other),
        }
    }

    pub fn weight_scheme(&self) -> Result<WeightScheme> {
        let scheme = match self.weighting.scheme.trim().to_ascii_lowercase().as_str() {
            "exp" | "exponential" => WeightScheme::Exponential {
                decay: self.weighting.decay,
            },
            "uniform" | "equal" => WeightScheme::Uniform,
            other => bail!(
                "invalid weighting.scheme '{}': expected 'exp' or 'uniform'",
                other
            ),
        };
        scheme
            .validate()
            .with_context(|| "weighting.decay is invalid".to_string())?;
        Ok(scheme)
    }

    pub fn to_params(&self) -> Result<AnalysisParams> {
        if self.lookback_months == 0 {
            bail!("analysis.lookback_months must be > 0");
        }
        Ok(AnalysisParams {
            anchor: self.month_anchor()?,
            trim: self.trim_policy()?,
            weights: self.weight_scheme()?,
            include_volatility: self.volatility,
        })
    }
}

impl Config {
    /// Read a TOML file, apply `.env` / environment overrides and validate
    /// the analysis section.
    pub fn load_from(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config = Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if let Ok(url) = std::env::var("NSE_BASE_URL") {
            if !url.trim().is_empty() {
                config.nse.base_url = url.trim().to_string();
            }
        }
        if let Ok(agent) = std::env::var("NSE_USER_AGENT") {
            if !agent.trim().is_empty() {
                config.nse.user_agent = agent.trim().to_string();
            }
        }

        config
            .analysis
            .to_params()
            .context("analysis section is invalid")?;

        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AppError::Config(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_toml_uses_defaults() {
        let toml_str = r#"
[analysis]
symbols = ["pfc", "RVNL", " PFC "]
"#;
        let config = Config::from_toml_str(toml_str).unwrap();
        assert_eq!(config.analysis.symbol_list(), vec!["PFC", "RVNL"]);
        assert_eq!(config.analysis.lookback_months, 24);
        assert_eq!(config.nse.chunk_days, 40);
        assert_eq!(config.logging.level, "info");
        let params = config.analysis.to_params().unwrap();
        assert_eq!(params.anchor, MonthAnchor::CalendarMonth);
        assert!(matches!(params.trim, TrimPolicy::Iqr { min_retained: 3, .. }));
    }

    #[test]
    fn weekday_parsing_accepts_short_and_long_names() {
        assert_eq!(parse_weekday("thu").unwrap(), Weekday::Thu);
        assert_eq!(parse_weekday("Tuesday").unwrap(), Weekday::Tue);
        assert!(parse_weekday("someday").is_err());
    }
}
