use crate::constants::{
    EQUITY_MARKER, EQUITY_SEPARATOR, RANGE_SEPARATOR, THOUSANDS_DIGITS, THOUSANDS_SUFFIX,
};
use crate::currency::{CurrencyConverter, CurrencyTable};
use crate::error::SalaryError;
use crate::job_post::JobPostData;
use crate::observability::metrics;
use crate::salary::symbol::extract_currency_symbol;
use crate::types::ParsedSalary;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Split "€42k - 75k | Equity" into the range and the equity suffix
pub fn split_equity(text: &str) -> (&str, Option<&str>) {
    if text.contains(EQUITY_MARKER) {
        if let Some((range, equity)) = text.split_once(EQUITY_SEPARATOR) {
            let equity = equity.trim();
            return (range.trim(), (!equity.is_empty()).then_some(equity));
        }
    }
    (text.trim(), None)
}

/// Parse the amount part of a range ("42k - 75k") into `(min, max)`.
///
/// Whitespace is removed and every `k` becomes `000` before splitting on `-`.
/// Anything other than exactly two unsigned integers is malformed. Reversed
/// bounds are swapped.
pub fn parse_bounds(range: &str) -> Result<(u64, u64), SalaryError> {
    let compact: String = range.chars().filter(|c| !c.is_whitespace()).collect();
    let expanded = compact.replace(THOUSANDS_SUFFIX, THOUSANDS_DIGITS);
    let malformed = || SalaryError::MalformedRangeShape {
        range: range.trim().to_string(),
    };

    let tokens: Vec<&str> = expanded.split(RANGE_SEPARATOR).collect();
    let [min, max] = tokens.as_slice() else {
        return Err(malformed());
    };
    let min: u64 = min.parse().map_err(|_| malformed())?;
    let max: u64 = max.parse().map_err(|_| malformed())?;

    if min > max {
        warn!("Salary range '{}' has its bounds reversed", range.trim());
        return Ok((max, min));
    }
    Ok((min, max))
}

fn record_issue(salary: &mut ParsedSalary, issue: SalaryError) {
    metrics::salary::issue(issue.kind());
    warn!(kind = issue.kind(), "{}", issue);
    salary.issues.push(issue);
}

/// Turns raw salary text into a [`ParsedSalary`] in the destination currency
pub struct SalaryNormalizer {
    table: Arc<CurrencyTable>,
    converter: Arc<CurrencyConverter>,
    dest_code: String,
}

impl SalaryNormalizer {
    pub fn new(
        table: Arc<CurrencyTable>,
        converter: Arc<CurrencyConverter>,
        dest_code: impl Into<String>,
    ) -> Self {
        Self {
            table,
            converter,
            dest_code: dest_code.into(),
        }
    }

    pub fn dest_code(&self) -> &str {
        &self.dest_code
    }

    pub fn table(&self) -> &CurrencyTable {
        &self.table
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    /// Parse a salary text such as "£71k - 85k | Equity".
    ///
    /// Never fails: every failure is recorded in `issues` and leaves the
    /// affected fields empty.
    #[instrument(skip(self), fields(dest = %self.dest_code))]
    pub async fn parse_range(&self, text: &str) -> ParsedSalary {
        metrics::salary::parsed();
        let mut salary = ParsedSalary::default();

        let (range, equity) = split_equity(text);
        if let Some(equity) = equity {
            debug!("Equity found in the salary text {}", text);
            salary.equity_text = Some(equity.to_string());
        }

        let Some((symbol, offset)) = extract_currency_symbol(range) else {
            record_issue(
                &mut salary,
                SalaryError::NoCurrencySymbolFound {
                    text: range.to_string(),
                },
            );
            return salary;
        };
        salary.currency_symbol = Some(symbol.to_string());

        match self.table.symbol_to_code(symbol) {
            Ok(code) => salary.currency_code = Some(code),
            Err(issue) => record_issue(&mut salary, issue),
        }

        let (min, max) = match parse_bounds(&range[offset..]) {
            Ok(bounds) => bounds,
            Err(issue) => {
                record_issue(&mut salary, issue);
                return salary;
            }
        };
        salary.min_amount = Some(min);
        salary.max_amount = Some(max);

        self.convert_bounds(&mut salary).await;
        salary
    }

    /// Normalize a salary whose currency code and bounds are already known,
    /// as in the `baseSalary` of the page's linked data.
    #[instrument(skip(self), fields(dest = %self.dest_code))]
    pub async fn normalize_linked_salary(
        &self,
        currency_code: Option<&str>,
        min: u64,
        max: u64,
    ) -> ParsedSalary {
        metrics::salary::parsed();
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let mut salary = ParsedSalary {
            currency_code: currency_code.map(str::to_string),
            min_amount: Some(min),
            max_amount: Some(max),
            ..ParsedSalary::default()
        };
        self.convert_bounds(&mut salary).await;
        salary
    }

    /// Salary of a scraped job post: the header text when present, otherwise
    /// the linked data base salary.
    pub async fn normalize_job_post(&self, post: &JobPostData) -> Option<ParsedSalary> {
        if let Some(text) = post.salary_text() {
            return Some(self.parse_range(text).await);
        }
        let linked = post.base_salary.as_ref()?;
        let (min, max) = linked.bounds()?;
        Some(
            self.normalize_linked_salary(linked.currency.as_deref(), min, max)
                .await,
        )
    }

    async fn convert_bounds(&self, salary: &mut ParsedSalary) {
        let (Some(min), Some(max)) = (salary.min_amount, salary.max_amount) else {
            return;
        };
        let Some(code) = salary.currency_code.clone() else {
            debug!("No conversion to {}: the currency is unknown", self.dest_code);
            return;
        };
        if code == self.dest_code {
            debug!(
                "The salary will not be converted to {} because it is already in the desired currency",
                self.dest_code
            );
            return;
        }

        match self.converter.convert(min, &code, &self.dest_code).await {
            Ok(conversion) => {
                salary.converted_min = Some(conversion.amount);
                salary.conversion_timestamp = Some(conversion.timestamp);
            }
            Err(issue) => record_issue(salary, issue),
        }
        match self.converter.convert(max, &code, &self.dest_code).await {
            Ok(conversion) => {
                salary.converted_max = Some(conversion.amount);
                salary.conversion_timestamp.get_or_insert(conversion.timestamp);
            }
            Err(issue) => record_issue(salary, issue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_equity() {
        assert_eq!(split_equity("€42k - 75k | Equity"), ("€42k - 75k", Some("Equity")));
        assert_eq!(split_equity("€42k - 75k"), ("€42k - 75k", None));
        // a pipe without the marker is left to the range parser
        assert_eq!(split_equity("€42k - 75k | Bonus"), ("€42k - 75k | Bonus", None));
    }

    #[test]
    fn test_parse_bounds_expands_thousands() {
        assert_eq!(parse_bounds("42k - 75k").unwrap(), (42000, 75000));
        assert_eq!(parse_bounds("42000-75000").unwrap(), (42000, 75000));
        assert_eq!(parse_bounds(" 1k -  2k ").unwrap(), (1000, 2000));
    }

    #[test]
    fn test_parse_bounds_swaps_reversed_range() {
        assert_eq!(parse_bounds("90k - 50k").unwrap(), (50000, 90000));
    }

    #[test]
    fn test_parse_bounds_rejects_other_shapes() {
        for range in ["42k", "42k - 75k - 90k", "42.5k - 75k", "k", "", "-"] {
            assert!(
                matches!(parse_bounds(range), Err(SalaryError::MalformedRangeShape { .. })),
                "expected malformed range for {:?}",
                range
            );
        }
    }
}
