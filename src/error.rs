use thiserror::Error;

/// Failures raised by the monthly estimator pipeline. Both variants are
/// final for the instrument being analysed; retrying with the same input
/// yields the same error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("insufficient data after {stage}: need {required}, got {got}")]
    InsufficientData {
        stage: &'static str,
        required: usize,
        got: usize,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EstimatorError {
    pub fn insufficient(stage: &'static str, required: usize, got: usize) -> Self {
        Self::InsufficientData {
            stage,
            required,
            got,
        }
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("NSE API error (status {status}): {url}")]
    NseApi { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
