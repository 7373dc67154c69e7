use crate::error::SalaryError;
use async_trait::async_trait;

/// External source of currency rates.
///
/// Implementations report an unknown pair as
/// [`SalaryError::RateUnavailable`] and an unreachable service as
/// [`SalaryError::NetworkUnavailable`].
#[async_trait]
pub trait RateLookupPort: Send + Sync {
    /// Multiplicative factor converting one unit of `base_code` into `dest_code`
    async fn lookup_rate(&self, base_code: &str, dest_code: &str) -> Result<f64, SalaryError>;
}

/// Sink for normalized job post records
#[async_trait]
pub trait SalaryOutputPort: Send + Sync {
    async fn write_record(&self, record: &crate::app::normalize_use_case::JobPostRecord) -> anyhow::Result<()>;
}
