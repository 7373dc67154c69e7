use crate::app::ports::RateLookupPort;
use crate::constants::rate_key;
use crate::error::SalaryError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Rate lookup over a fixed table keyed by "BASE_DEST", for offline runs
#[derive(Debug, Clone, Default)]
pub struct StaticRateLookup {
    rates: HashMap<String, f64>,
}

impl StaticRateLookup {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    pub fn with_rate(mut self, base_code: &str, dest_code: &str, rate: f64) -> Self {
        self.rates.insert(rate_key(base_code, dest_code), rate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
impl RateLookupPort for StaticRateLookup {
    async fn lookup_rate(&self, base_code: &str, dest_code: &str) -> Result<f64, SalaryError> {
        if base_code == dest_code {
            return Ok(1.0);
        }
        self.rates
            .get(&rate_key(base_code, dest_code))
            .copied()
            .ok_or_else(|| SalaryError::RateUnavailable {
                base: base_code.to_string(),
                dest: dest_code.to_string(),
                message: "no fixed rate configured".to_string(),
            })
    }
}
