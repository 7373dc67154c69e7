//! Fields of the `JobPosting` JSON-LD object embedded in a job post page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `baseSalary` of a JobPosting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedSalary {
    pub currency: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl LinkedSalary {
    /// Rounded integer bounds, if both are present and non-negative
    pub fn bounds(&self) -> Option<(u64, u64)> {
        let min = self.min_value.filter(|v| v.is_finite() && *v >= 0.0)?;
        let max = self.max_value.filter(|v| v.is_finite() && *v >= 0.0)?;
        let (min, max) = (min.round() as u64, max.round() as u64);
        Some(if min <= max { (min, max) } else { (max, min) })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Split a comma-separated string like "Architecture, Developer APIs"
pub(crate) fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A field that is either an array of strings or a comma-separated string
pub(crate) fn list_field(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => split_list(s),
        _ => Vec::new(),
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn base_salary(posting: &Value) -> Option<LinkedSalary> {
    let base = posting.get("baseSalary")?;
    let value = base.get("value");
    let salary = LinkedSalary {
        currency: str_field(base, "currency"),
        min_value: number(value.and_then(|v| v.get("minValue"))),
        max_value: number(value.and_then(|v| v.get("maxValue"))),
    };
    if salary.currency.is_none() && salary.min_value.is_none() && salary.max_value.is_none() {
        return None;
    }
    Some(salary)
}

fn location(place: &Value) -> Option<JobLocation> {
    let address = place.get("address")?;
    let country = match address.get("addressCountry") {
        Some(Value::Object(_)) => address.get("addressCountry").and_then(|c| str_field(c, "name")),
        _ => str_field(address, "addressCountry"),
    };
    let loc = JobLocation {
        city: str_field(address, "addressLocality"),
        region: str_field(address, "addressRegion"),
        country,
    };
    (loc != JobLocation::default()).then_some(loc)
}

pub(crate) fn job_locations(posting: &Value) -> Vec<JobLocation> {
    match posting.get("jobLocation") {
        Some(Value::Array(places)) => places.iter().filter_map(location).collect(),
        Some(place @ Value::Object(_)) => location(place).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Whether `value` is a JSON-LD object typed as a JobPosting
pub(crate) fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "JobPosting",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("JobPosting")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_salary_reads_numbers_and_strings() {
        let posting = json!({
            "baseSalary": {
                "currency": "EUR",
                "value": {"minValue": 42000, "maxValue": "75000"}
            }
        });
        let salary = base_salary(&posting).unwrap();
        assert_eq!(salary.currency.as_deref(), Some("EUR"));
        assert_eq!(salary.bounds(), Some((42000, 75000)));
    }

    #[test]
    fn test_empty_base_salary_is_none() {
        assert!(base_salary(&json!({"baseSalary": {}})).is_none());
        assert!(base_salary(&json!({})).is_none());
    }

    #[test]
    fn test_job_locations_accepts_object_or_array() {
        let single = json!({"jobLocation": {"address": {"addressLocality": "Berlin", "addressCountry": "DE"}}});
        let many = json!({"jobLocation": [
            {"address": {"addressLocality": "Austin", "addressRegion": "TX", "addressCountry": "US"}},
            {"address": {"addressCountry": {"name": "Canada"}}}
        ]});

        assert_eq!(job_locations(&single)[0].city.as_deref(), Some("Berlin"));
        let locations = job_locations(&many);
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].region.as_deref(), Some("TX"));
        assert_eq!(locations[1].country.as_deref(), Some("Canada"));
    }

    #[test]
    fn test_list_field_splits_strings() {
        let posting = json!({"skills": ["rust", " go "], "experienceRequirements": "Senior, Lead"});
        assert_eq!(list_field(&posting, "skills"), vec!["rust", "go"]);
        assert_eq!(list_field(&posting, "experienceRequirements"), vec!["Senior", "Lead"]);
    }
}
