//! Metrics for the salary normalization run
//!
//! Recording functions are grouped by phase. They are no-ops until a recorder
//! is installed with [`init`].

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::OnceLock;
use tracing::info;

/// All metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Job post metrics
    JobPostsExtracted,
    JobPostsWithoutSalary,

    // Salary metrics
    SalariesParsed,
    SalaryIssues,

    // Rate metrics
    RateCacheHits,
    RateCacheMisses,
    RateLookupDuration,
    ConversionsSuccess,
    ConversionsError,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::JobPostsExtracted => "jobs_job_posts_extracted_total",
            MetricName::JobPostsWithoutSalary => "jobs_job_posts_without_salary_total",
            MetricName::SalariesParsed => "jobs_salaries_parsed_total",
            MetricName::SalaryIssues => "jobs_salary_issues_total",
            MetricName::RateCacheHits => "jobs_rate_cache_hits_total",
            MetricName::RateCacheMisses => "jobs_rate_cache_misses_total",
            MetricName::RateLookupDuration => "jobs_rate_lookup_duration_seconds",
            MetricName::ConversionsSuccess => "jobs_conversions_success_total",
            MetricName::ConversionsError => "jobs_conversions_error_total",
        }
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice is a no-op.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Prometheus text rendering of everything recorded so far
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod job_post {
    use super::MetricName;

    pub fn extracted() {
        ::metrics::counter!(MetricName::JobPostsExtracted.as_str()).increment(1);
    }

    pub fn without_salary() {
        ::metrics::counter!(MetricName::JobPostsWithoutSalary.as_str()).increment(1);
    }
}

pub mod salary {
    use super::MetricName;

    pub fn parsed() {
        ::metrics::counter!(MetricName::SalariesParsed.as_str()).increment(1);
    }

    pub fn issue(kind: &'static str) {
        ::metrics::counter!(MetricName::SalaryIssues.as_str(), "kind" => kind).increment(1);
    }
}

pub mod rates {
    use super::MetricName;

    pub fn cache_hit() {
        ::metrics::counter!(MetricName::RateCacheHits.as_str()).increment(1);
    }

    pub fn cache_miss() {
        ::metrics::counter!(MetricName::RateCacheMisses.as_str()).increment(1);
    }

    pub fn lookup(secs: f64) {
        ::metrics::histogram!(MetricName::RateLookupDuration.as_str()).record(secs);
    }

    pub fn conversion_success() {
        ::metrics::counter!(MetricName::ConversionsSuccess.as_str()).increment(1);
    }

    pub fn conversion_error(kind: &'static str) {
        ::metrics::counter!(MetricName::ConversionsError.as_str(), "kind" => kind).increment(1);
    }
}
