use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::app::ports::SalaryOutputPort;
use crate::config::StatsConfig;
use crate::job_post::JobPostData;
use crate::observability::metrics;
use crate::salary::SalaryNormalizer;
use crate::stats::{average_by_key, filter_mid_ranges, GroupAverage, SalaryStats};
use crate::types::ParsedSalary;

/// A scraped job post together with its normalized salary
#[derive(Debug, Clone, Serialize)]
pub struct JobPostRecord {
    /// Where the page was read from
    pub source: String,
    pub post: JobPostData,
    pub salary: Option<ParsedSalary>,
}

/// Salary summary of a batch of job posts
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total_posts: usize,
    pub posts_with_salary: usize,
    pub posts_normalized: usize,
    pub outliers_removed: usize,
    pub issues_by_kind: BTreeMap<&'static str, usize>,
    pub mid_range_stats: Option<SalaryStats>,
    pub average_by_country: Vec<GroupAverage<String>>,
}

/// Use case for normalizing the salaries of scraped job posts
pub struct NormalizeJobPostsUseCase {
    normalizer: Arc<SalaryNormalizer>,
    output: Arc<dyn SalaryOutputPort>,
    stats: StatsConfig,
    concurrency: usize,
}

impl NormalizeJobPostsUseCase {
    pub fn new(
        normalizer: Arc<SalaryNormalizer>,
        output: Arc<dyn SalaryOutputPort>,
        stats: StatsConfig,
    ) -> Self {
        Self {
            normalizer,
            output,
            stats,
            concurrency: 1,
        }
    }

    /// Number of job posts normalized at the same time
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Normalize a single job post and write it to the output
    pub async fn normalize_post(&self, source: &str, post: JobPostData) -> Result<JobPostRecord> {
        let salary = self.normalizer.normalize_job_post(&post).await;
        if salary.is_none() {
            metrics::job_post::without_salary();
        }
        let record = JobPostRecord {
            source: source.to_string(),
            post,
            salary,
        };
        self.output.write_record(&record).await?;
        Ok(record)
    }

    /// Normalize job posts in batch. Records are written in input order.
    pub async fn normalize_batch(&self, posts: Vec<(String, JobPostData)>) -> Result<(Vec<JobPostRecord>, BatchSummary)> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let total = posts.len();

        for (index, (source, post)) in posts.into_iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let normalizer = self.normalizer.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let salary = normalizer.normalize_job_post(&post).await;
                (index, JobPostRecord { source, post, salary })
            });
        }

        let mut indexed = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            indexed.push(joined?);
        }
        indexed.sort_by_key(|(index, _)| *index);

        let mut records = Vec::with_capacity(total);
        for (_, record) in indexed {
            if record.salary.is_none() {
                metrics::job_post::without_salary();
            }
            self.output.write_record(&record).await?;
            records.push(record);
        }

        let summary = self.summarize(&records);
        info!(
            total = summary.total_posts,
            with_salary = summary.posts_with_salary,
            normalized = summary.posts_normalized,
            "Normalized job post batch"
        );
        Ok((records, summary))
    }

    /// Statistics over the mid-range salaries expressed in the destination currency
    pub fn summarize(&self, records: &[JobPostRecord]) -> BatchSummary {
        let dest = self.normalizer.dest_code();
        let mut summary = BatchSummary {
            total_posts: records.len(),
            ..BatchSummary::default()
        };

        let mut mid_ranges = Vec::new();
        let mut by_country = Vec::new();
        for record in records {
            let Some(salary) = &record.salary else {
                continue;
            };
            summary.posts_with_salary += 1;
            for issue in &salary.issues {
                *summary.issues_by_kind.entry(issue.kind()).or_insert(0) += 1;
            }

            let Some(mid) = salary.mid_range(dest) else {
                continue;
            };
            summary.posts_normalized += 1;
            mid_ranges.push(mid);

            let within = mid >= self.stats.min_mid_range as f64 && mid <= self.stats.max_mid_range as f64;
            if let Some(country) = record.post.locations.iter().find_map(|l| l.country.clone()) {
                if within {
                    by_country.push((country, mid));
                }
            }
        }

        let kept = filter_mid_ranges(&mid_ranges, self.stats.min_mid_range, self.stats.max_mid_range);
        summary.outliers_removed = mid_ranges.len() - kept.len();
        if summary.outliers_removed > 0 {
            warn!(
                "{} mid-range salaries fall outside [{}, {}] and were discarded",
                summary.outliers_removed, self.stats.min_mid_range, self.stats.max_mid_range
            );
        }
        summary.mid_range_stats = SalaryStats::from_mid_ranges(&kept);
        summary.average_by_country = average_by_key(by_country);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{CurrencyConverter, CurrencyTable};
    use crate::infra::StaticRateLookup;
    use crate::job_post::{JobLocation, LinkedSalary};
    use async_trait::async_trait;

    struct MockSalaryOutput {
        pub sources: Arc<tokio::sync::Mutex<Vec<String>>>,
    }

    impl MockSalaryOutput {
        pub fn new() -> Self {
            Self {
                sources: Arc::new(tokio::sync::Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl SalaryOutputPort for MockSalaryOutput {
        async fn write_record(&self, record: &JobPostRecord) -> Result<()> {
            self.sources.lock().await.push(record.source.clone());
            Ok(())
        }
    }

    fn post(salary_text: Option<&str>, country: &str) -> JobPostData {
        let mut post = JobPostData::default();
        if let Some(text) = salary_text {
            post.header_items.insert("salary".to_string(), text.to_string());
        }
        post.locations.push(JobLocation {
            country: Some(country.to_string()),
            ..JobLocation::default()
        });
        post
    }

    fn use_case(output: Arc<MockSalaryOutput>) -> NormalizeJobPostsUseCase {
        let lookup = Arc::new(StaticRateLookup::default().with_rate("EUR", "USD", 1.1));
        let normalizer = SalaryNormalizer::new(
            Arc::new(CurrencyTable::bundled().unwrap()),
            Arc::new(CurrencyConverter::with_unbounded_cache(lookup)),
            "USD",
        );
        NormalizeJobPostsUseCase::new(Arc::new(normalizer), output, StatsConfig::default())
            .with_concurrency(4)
    }

    #[tokio::test]
    async fn test_normalize_batch_keeps_input_order() {
        let output = Arc::new(MockSalaryOutput::new());
        let sources_ref = output.sources.clone();
        let use_case = use_case(output);

        let posts = vec![
            ("a.html".to_string(), post(Some("€42k - 75k"), "DE")),
            ("b.html".to_string(), post(Some("$100k - 140k | Equity"), "US")),
            ("c.html".to_string(), post(None, "US")),
            ("d.html".to_string(), post(Some("¥5000k - 6000k"), "JP")),
        ];
        let (records, summary) = use_case.normalize_batch(posts).await.unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(*sources_ref.lock().await, vec!["a.html", "b.html", "c.html", "d.html"]);
        assert_eq!(summary.total_posts, 4);
        assert_eq!(summary.posts_with_salary, 3);
        // yen has two table entries and no override
        assert_eq!(summary.posts_normalized, 2);
        assert_eq!(summary.issues_by_kind.get("unknown_symbol"), Some(&1));

        let stats = summary.mid_range_stats.unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.max, 120_000.0);
        assert_eq!(summary.average_by_country[0].key, "US");
    }

    #[tokio::test]
    async fn test_linked_salary_used_without_header_text() {
        let output = Arc::new(MockSalaryOutput::new());
        let use_case = use_case(output);

        let mut linked = post(None, "DE");
        linked.base_salary = Some(LinkedSalary {
            currency: Some("EUR".to_string()),
            min_value: Some(50_000.0),
            max_value: Some(60_000.0),
        });
        let record = use_case.normalize_post("e.html", linked).await.unwrap();

        let salary = record.salary.unwrap();
        assert_eq!(salary.currency_code.as_deref(), Some("EUR"));
        assert_eq!(salary.converted_min, Some(55_000));
        assert_eq!(salary.converted_max, Some(66_000));
    }

    #[tokio::test]
    async fn test_outliers_are_excluded_from_stats() {
        let output = Arc::new(MockSalaryOutput::new());
        let use_case = use_case(output);

        let posts = vec![
            ("low.html".to_string(), post(Some("$1k - 2k"), "US")),
            ("ok.html".to_string(), post(Some("$80k - 100k"), "US")),
        ];
        let (_, summary) = use_case.normalize_batch(posts).await.unwrap();
        assert_eq!(summary.posts_normalized, 2);
        assert_eq!(summary.outliers_removed, 1);
        assert_eq!(summary.mid_range_stats.unwrap().mean, 90_000.0);
    }
}
