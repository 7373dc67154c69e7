use crate::app::ports::RateLookupPort;
use crate::config::RatesConfig;
use crate::error::{Result, SalaryError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("job_salary_scraper/", env!("CARGO_PKG_VERSION"));

/// Body of `GET /latest?from=EUR&to=USD`
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Extract the `dest_code` rate from a Frankfurter-style response body
pub fn rate_from_response(body: &str, base_code: &str, dest_code: &str) -> std::result::Result<f64, SalaryError> {
    let unavailable = |message: String| SalaryError::RateUnavailable {
        base: base_code.to_string(),
        dest: dest_code.to_string(),
        message,
    };
    let response: LatestRatesResponse =
        serde_json::from_str(body).map_err(|e| unavailable(format!("invalid response: {}", e)))?;
    match response.rates.get(dest_code) {
        Some(rate) if rate.is_finite() && *rate > 0.0 => Ok(*rate),
        Some(rate) => Err(unavailable(format!("invalid rate {}", rate))),
        None => Err(unavailable("rate missing from response".to_string())),
    }
}

/// Rate lookup against a Frankfurter-compatible HTTP API
pub struct HttpRateLookup {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpRateLookup {
    pub fn new(config: &RatesConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        })
    }

    fn latest_url(&self, base_code: &str, dest_code: &str) -> String {
        format!("{}/latest?from={}&to={}", self.base_url, base_code, dest_code)
    }

    async fn fetch_once(&self, base_code: &str, dest_code: &str) -> std::result::Result<f64, SalaryError> {
        let network = |message: String| SalaryError::NetworkUnavailable {
            base: base_code.to_string(),
            dest: dest_code.to_string(),
            message,
        };

        let url = self.latest_url(base_code, dest_code);
        debug!("Requesting rate from {}", url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(network(format!("rate service returned {}", status)));
        }
        if !status.is_success() {
            return Err(SalaryError::RateUnavailable {
                base: base_code.to_string(),
                dest: dest_code.to_string(),
                message: format!("rate service returned {}", status),
            });
        }

        let body = resp.text().await.map_err(|e| network(e.to_string()))?;
        rate_from_response(&body, base_code, dest_code)
    }
}

#[async_trait]
impl RateLookupPort for HttpRateLookup {
    async fn lookup_rate(&self, base_code: &str, dest_code: &str) -> std::result::Result<f64, SalaryError> {
        if base_code == dest_code {
            return Ok(1.0);
        }

        let mut attempt = 0;
        loop {
            match self.fetch_once(base_code, dest_code).await {
                Err(e @ SalaryError::NetworkUnavailable { .. }) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Rate lookup {}->{} failed (attempt {}/{}): {}",
                        base_code,
                        dest_code,
                        attempt,
                        self.max_retries + 1,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_response() {
        let body = r#"{"amount":1.0,"base":"EUR","date":"2024-05-02","rates":{"USD":1.0723}}"#;
        assert_eq!(rate_from_response(body, "EUR", "USD").unwrap(), 1.0723);
    }

    #[test]
    fn test_missing_rate_is_unavailable() {
        let body = r#"{"amount":1.0,"base":"EUR","rates":{"GBP":0.85}}"#;
        assert!(matches!(
            rate_from_response(body, "EUR", "USD"),
            Err(SalaryError::RateUnavailable { .. })
        ));
        assert!(matches!(
            rate_from_response("not json", "EUR", "USD"),
            Err(SalaryError::RateUnavailable { .. })
        ));
    }

    #[test]
    fn test_latest_url_trims_trailing_slash() {
        let config = RatesConfig {
            api_base_url: "https://rates.example.com/".to_string(),
            ..RatesConfig::default()
        };
        let lookup = HttpRateLookup::new(&config).unwrap();
        assert_eq!(
            lookup.latest_url("GBP", "USD"),
            "https://rates.example.com/latest?from=GBP&to=USD"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_unavailable() {
        // Nothing listens on port 9 of localhost
        let config = RatesConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            max_retries: 1,
            retry_delay_ms: 1,
            ..RatesConfig::default()
        };
        let lookup = HttpRateLookup::new(&config).unwrap();
        let err = lookup.lookup_rate("EUR", "USD").await.unwrap_err();
        assert!(matches!(err, SalaryError::NetworkUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_same_currency_needs_no_request() {
        let config = RatesConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..RatesConfig::default()
        };
        let lookup = HttpRateLookup::new(&config).unwrap();
        assert_eq!(lookup.lookup_rate("USD", "USD").await.unwrap(), 1.0);
    }
}
