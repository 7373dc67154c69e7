//! Descriptive statistics over normalized salaries

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// Mean of a job post's minimum and maximum advertised salary
pub fn mid_range(min: u64, max: u64) -> f64 {
    (min as f64 + max as f64) / 2.0
}

/// Keep mid-range salaries inside `[min_threshold, max_threshold]`
pub fn filter_mid_ranges(values: &[f64], min_threshold: u64, max_threshold: u64) -> Vec<f64> {
    values
        .iter()
        .copied()
        .filter(|v| *v >= min_threshold as f64 && *v <= max_threshold as f64)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalaryStats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SalaryStats {
    /// `None` for an empty slice
    pub fn from_mid_ranges(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAverage<K> {
    pub key: K,
    pub average: f64,
    pub count: usize,
}

/// Average mid-range salary per key, highest average first.
/// Ties are broken by count, then by key.
pub fn average_by_key<K, I>(items: I) -> Vec<GroupAverage<K>>
where
    K: Eq + Hash + Ord + Clone,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut sums: HashMap<K, (f64, usize)> = HashMap::new();
    for (key, value) in items {
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let mut groups: Vec<GroupAverage<K>> = sums
        .into_iter()
        .map(|(key, (sum, count))| GroupAverage {
            key,
            average: sum / count as f64,
            count,
        })
        .collect();
    groups.sort_by(|a, b| {
        b.average
            .total_cmp(&a.average)
            .then(b.count.cmp(&a.count))
            .then_with(|| a.key.cmp(&b.key))
    });
    groups
}
