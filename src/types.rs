use crate::error::SalaryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the currency reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyEntry {
    #[serde(rename = "cc", alias = "code")]
    pub code: String,
    pub symbol: String,
    pub name: String,
}

impl CurrencyEntry {
    pub fn new(code: &str, symbol: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

/// Structured salary extracted from a job post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedSalary {
    /// Leading symbol run as it appeared in the text, e.g. "C$"
    pub currency_symbol: Option<String>,
    pub currency_code: Option<String>,
    pub min_amount: Option<u64>,
    pub max_amount: Option<u64>,
    pub equity_text: Option<String>,
    pub converted_min: Option<u64>,
    pub converted_max: Option<u64>,
    pub conversion_timestamp: Option<DateTime<Utc>>,
    /// Every recoverable failure hit while producing this record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<SalaryError>,
}

impl ParsedSalary {
    pub fn has_amounts(&self) -> bool {
        self.min_amount.is_some() && self.max_amount.is_some()
    }

    /// Bounds expressed in `dest_code`: the converted amounts, or the original
    /// ones when the salary was already advertised in that currency.
    pub fn normalized_range(&self, dest_code: &str) -> Option<(u64, u64)> {
        if self.currency_code.as_deref() == Some(dest_code) {
            return Some((self.min_amount?, self.max_amount?));
        }
        Some((self.converted_min?, self.converted_max?))
    }

    /// Mean of the normalized bounds
    pub fn mid_range(&self, dest_code: &str) -> Option<f64> {
        self.normalized_range(dest_code)
            .map(|(min, max)| crate::stats::mid_range(min, max))
    }
}
