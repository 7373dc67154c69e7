use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recoverable failures of the salary normalization pipeline.
///
/// None of these abort a run: they are recorded on the returned
/// [`ParsedSalary`](crate::types::ParsedSalary) and logged, and the caller
/// decides whether the job post is still usable.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SalaryError {
    #[error("No currency symbol found in salary text '{text}'")]
    NoCurrencySymbolFound { text: String },

    #[error("Could not resolve currency symbol '{symbol}' ({candidates} candidate codes)")]
    AmbiguousOrUnknownSymbol { symbol: String, candidates: usize },

    #[error("Salary range '{range}' is not two hyphen-separated integers")]
    MalformedRangeShape { range: String },

    #[error("No rate available for {base}->{dest}: {message}")]
    RateUnavailable {
        base: String,
        dest: String,
        message: String,
    },

    #[error("Rate service unreachable for {base}->{dest}: {message}")]
    NetworkUnavailable {
        base: String,
        dest: String,
        message: String,
    },
}

impl SalaryError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SalaryError::NoCurrencySymbolFound { .. } => "no_currency_symbol",
            SalaryError::AmbiguousOrUnknownSymbol { .. } => "unknown_symbol",
            SalaryError::MalformedRangeShape { .. } => "malformed_range",
            SalaryError::RateUnavailable { .. } => "rate_unavailable",
            SalaryError::NetworkUnavailable { .. } => "network_unavailable",
        }
    }
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid linked data in job post: {0}")]
    LinkedData(String),

    #[error("Currency table error: {0}")]
    CurrencyTable(String),

    #[error(transparent)]
    Salary(#[from] SalaryError),
}

pub type Result<T> = std::result::Result<T, ScraperError>;
