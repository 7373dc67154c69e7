use crate::app::ports::RateLookupPort;
use crate::currency::cache::{RateCache, RateSource};
use crate::error::SalaryError;
use crate::observability::metrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Result of a successful conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub amount: u64,
    pub rate: f64,
    /// Wall-clock time of the conversion, not the rate's reference date
    pub timestamp: DateTime<Utc>,
}

/// Round to the nearest integer, halves away from zero (500.5 -> 501)
pub fn round_converted(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

/// Converts amounts through a [`RateCache`] backed by a rate lookup
pub struct CurrencyConverter {
    lookup: Arc<dyn RateLookupPort>,
    cache: RateCache,
}

impl CurrencyConverter {
    pub fn new(lookup: Arc<dyn RateLookupPort>, cache: RateCache) -> Self {
        Self { lookup, cache }
    }

    /// Converter with a cache that never expires
    pub fn with_unbounded_cache(lookup: Arc<dyn RateLookupPort>) -> Self {
        Self::new(lookup, RateCache::default())
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    async fn rate(&self, base_code: &str, dest_code: &str) -> Result<f64, SalaryError> {
        let (rate, source) = self
            .cache
            .get_or_fetch(base_code, dest_code, || async {
                let started = Instant::now();
                let rate = self.lookup.lookup_rate(base_code, dest_code).await;
                metrics::rates::lookup(started.elapsed().as_secs_f64());
                let rate = rate?;
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(SalaryError::RateUnavailable {
                        base: base_code.to_string(),
                        dest: dest_code.to_string(),
                        message: format!("invalid rate {}", rate),
                    });
                }
                Ok(rate)
            })
            .await?;

        match source {
            RateSource::Cache => {
                metrics::rates::cache_hit();
                debug!("The cached rate {} is used for {}-->{}", rate, base_code, dest_code);
            }
            RateSource::Fetched => {
                metrics::rates::cache_miss();
                debug!("The rate {} is cached for {}-->{}", rate, base_code, dest_code);
            }
        }
        Ok(rate)
    }

    /// Convert `amount` from `base_code` into `dest_code`
    pub async fn convert(
        &self,
        amount: u64,
        base_code: &str,
        dest_code: &str,
    ) -> Result<Conversion, SalaryError> {
        match self.rate(base_code, dest_code).await {
            Ok(rate) => {
                metrics::rates::conversion_success();
                Ok(Conversion {
                    amount: round_converted(rate * amount as f64),
                    rate,
                    timestamp: Utc::now(),
                })
            }
            Err(e) => {
                metrics::rates::conversion_error(e.kind());
                warn!(
                    "The amount {} in {} couldn't be converted to {}: {}",
                    amount, base_code, dest_code, e
                );
                Err(e)
            }
        }
    }
}
