/// Currency every parsed salary is normalized into unless configured otherwise
pub const DEFAULT_DEST_CURRENCY: &str = "USD";

/// Marker that flags an equity suffix, e.g. "€42k - 75k | Equity"
pub const EQUITY_MARKER: &str = "Equity";

/// Separator between the salary range and the equity suffix
pub const EQUITY_SEPARATOR: char = '|';

/// Range separator between the minimum and maximum amounts
pub const RANGE_SEPARATOR: char = '-';

/// Thousands suffix, substituted textually with `THOUSANDS_DIGITS`
pub const THOUSANDS_SUFFIX: &str = "k";
pub const THOUSANDS_DIGITS: &str = "000";

// Rate service defaults
pub const DEFAULT_RATES_API_URL: &str = "https://api.frankfurter.app";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

// Mid-range salaries outside [MIN, MAX] are treated as outliers
pub const MIN_MID_RANGE_SALARY_THRESHOLD: u64 = 15_000;
pub const MAX_MID_RANGE_SALARY_THRESHOLD: u64 = 400_000;

// Environment overrides for config.toml
pub const ENV_DEST_CURRENCY: &str = "SALARY_DEST_CURRENCY";
pub const ENV_RATES_API_URL: &str = "RATES_API_URL";

/// Build the rate cache key for a currency pair
pub fn rate_key(base_code: &str, dest_code: &str) -> String {
    format!("{}_{}", base_code, dest_code)
}
