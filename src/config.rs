use crate::constants::{
    DEFAULT_DEST_CURRENCY, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_RATES_API_URL,
    DEFAULT_RETRY_DELAY_MS, ENV_DEST_CURRENCY, ENV_RATES_API_URL,
    MAX_MID_RANGE_SALARY_THRESHOLD, MIN_MID_RANGE_SALARY_THRESHOLD,
};
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency: CurrencyConfig,
    pub rates: RatesConfig,
    pub stats: StatsConfig,
    pub logging: LoggingConfig,
    /// File the configuration was read from, `None` for built-in defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Currency every salary is normalized into
    pub destination: String,
    /// JSON file of `{cc, symbol, name}` records; the bundled table when unset
    pub table_path: Option<PathBuf>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            destination: DEFAULT_DEST_CURRENCY.to_string(),
            table_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    pub api_base_url: String,
    pub timeout_seconds: u64,
    /// Retries of an unreachable rate service; 0 disables retrying
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Cached rates are trusted for the whole run when unset
    pub cache_ttl_seconds: Option<u64>,
    /// Fixed rates keyed by "BASE_DEST", used instead of the rate service
    pub fixed: HashMap<String, f64>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_RATES_API_URL.to_string(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
            max_retries: 0,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            cache_ttl_seconds: None,
            fixed: HashMap::new(),
        }
    }
}

impl RatesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub min_mid_range: u64,
    pub max_mid_range: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            min_mid_range: MIN_MID_RANGE_SALARY_THRESHOLD,
            max_mid_range: MAX_MID_RANGE_SALARY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
        }
    }
}

impl Config {
    /// Load `path`, falling back to defaults when the file does not exist.
    /// Environment overrides are applied last.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::read_file(path.as_ref())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let mut config: Config = toml::from_str(&config_content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dest) = var(ENV_DEST_CURRENCY) {
            self.currency.destination = dest.trim().to_uppercase();
        }
        if let Some(url) = var(ENV_RATES_API_URL) {
            self.rates.api_base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let dest = &self.currency.destination;
        if dest.len() != 3 || !dest.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ScraperError::Config(format!(
                "destination currency '{}' is not a three-letter code",
                dest
            )));
        }
        if self.stats.min_mid_range > self.stats.max_mid_range {
            return Err(ScraperError::Config(format!(
                "stats.min_mid_range ({}) exceeds stats.max_mid_range ({})",
                self.stats.min_mid_range, self.stats.max_mid_range
            )));
        }
        if let Some((key, rate)) = self.rates.fixed.iter().find(|(_, r)| !(r.is_finite() && **r > 0.0)) {
            return Err(ScraperError::Config(format!(
                "fixed rate {} must be positive, got {}",
                key, rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.currency.destination, "USD");
        assert_eq!(config.rates.timeout(), Duration::from_secs(5));
        assert_eq!(config.rates.cache_ttl(), None);
        assert_eq!(config.stats.min_mid_range, 15_000);
        assert_eq!(config.stats.max_mid_range, 400_000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [currency]
            destination = "EUR"

            [rates]
            cache_ttl_seconds = 3600

            [rates.fixed]
            GBP_EUR = 1.15
            "#,
        )
        .unwrap();
        assert_eq!(config.currency.destination, "EUR");
        assert_eq!(config.rates.cache_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(config.rates.fixed.get("GBP_EUR"), Some(&1.15));
        assert_eq!(config.rates.api_base_url, DEFAULT_RATES_API_URL);
    }

    #[test]
    fn test_invalid_destination_is_rejected() {
        let err = Config::from_toml("[currency]\ndestination = \"dollars\"").unwrap_err();
        assert!(matches!(err, ScraperError::Config(_)));
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        let err = Config::from_toml("[stats]\nmin_mid_range = 10\nmax_mid_range = 5").unwrap_err();
        assert!(matches!(err, ScraperError::Config(_)));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::read_file(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.stats.max_mid_range, 400_000);
        assert_eq!(config.currency.destination, "USD");
        assert!(config.source.is_none());
    }

    #[test]
    fn test_read_file_records_its_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[rates]\nmax_retries = 2\nretry_delay_ms = 10\n").unwrap();

        let config = Config::read_file(&path).unwrap();
        assert_eq!(config.rates.max_retries, 2);
        assert_eq!(config.rates.retry_delay(), Duration::from_millis(10));
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = Config::from_toml("[currency]\ndestination = \"EUR\"").unwrap();
        let vars: HashMap<&str, &str> = [
            (ENV_DEST_CURRENCY, " gbp "),
            (ENV_RATES_API_URL, "http://localhost:8080"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.currency.destination, "GBP");
        assert_eq!(config.rates.api_base_url, "http://localhost:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_overrides_keep_file_values() {
        let mut config = Config::from_toml("[currency]\ndestination = \"EUR\"").unwrap();
        config.apply_overrides(|_| None);
        assert_eq!(config.currency.destination, "EUR");
        assert_eq!(config.rates.api_base_url, DEFAULT_RATES_API_URL);
    }
}
