//! Extraction of job data from a cached job post webpage
//!
//! Two sources on the page are read: the `application/ld+json` linked data
//! (title, company, base salary, location, ...) and the items of the job
//! details header whose class starts with `-` (e.g. `<span class="-salary">`).
//! The header salary is the free-text range handed to the salary normalizer.

pub mod linked_data;

pub use linked_data::{JobLocation, LinkedSalary};

use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use linked_data::{base_salary, is_job_posting, job_locations, list_field, str_field};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

static LINKED_DATA_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector"));
static JOB_DETAILS_HEADER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("header.job-details--header").expect("valid selector"));
static HEADER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("header").expect("valid selector"));
static ANY_ELEMENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("valid selector"));
static CANONICAL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"link[rel="canonical"], meta[property="og:url"]"#).expect("valid selector")
});
static JOB_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/jobs/(\d+)").expect("valid regex"));

/// Structured data scraped from one job post page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPostData {
    pub job_id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub company_name: Option<String>,
    pub company_description: Option<String>,
    pub company_site_url: Option<String>,
    pub employment_type: Option<String>,
    pub date_posted: Option<String>,
    pub valid_through: Option<String>,
    pub experience_level: Vec<String>,
    pub industry: Option<String>,
    pub skills: Vec<String>,
    pub job_benefits: Vec<String>,
    pub base_salary: Option<LinkedSalary>,
    pub locations: Vec<JobLocation>,
    /// Header items keyed by their class without the leading `-`
    pub header_items: BTreeMap<String, String>,
}

impl JobPostData {
    /// Raw salary text from the header, e.g. "€42k - 75k | Equity"
    pub fn salary_text(&self) -> Option<&str> {
        self.header_items.get("salary").map(String::as_str)
    }

    pub fn header_item(&self, key: &str) -> Option<&str> {
        self.header_items.get(key).map(String::as_str)
    }
}

fn element_text(element: &ElementRef) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Extract `<id>` from an URL like `https://stackoverflow.com/jobs/12345/title`
pub fn job_id_from_url(url: &str) -> Option<String> {
    JOB_ID_RE.captures(url).map(|c| c[1].to_string())
}

pub struct JobPostPage;

impl JobPostPage {
    pub fn parse(html: &str) -> Result<JobPostData> {
        let document = Html::parse_document(html);
        let mut data = JobPostData::default();

        data.url = document
            .select(&CANONICAL_SELECTOR)
            .find_map(|el| el.value().attr("href").or_else(|| el.value().attr("content")))
            .map(str::to_string);
        data.job_id = data.url.as_deref().and_then(job_id_from_url);

        match Self::linked_data(&document)? {
            Some(posting) => Self::apply_linked_data(&mut data, &posting),
            None => warn!(
                "The page {} doesn't contain any SCRIPT tag with type='application/ld+json'",
                data.url.as_deref().unwrap_or("<unknown url>")
            ),
        }

        data.header_items = Self::header_items(&document);
        metrics::job_post::extracted();
        debug!(
            job_id = data.job_id.as_deref().unwrap_or("-"),
            header_items = data.header_items.len(),
            "Extracted job post data"
        );
        Ok(data)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<JobPostData> {
        let html = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&html)
    }

    /// The JobPosting object, or the first linked data block if none is typed
    fn linked_data(document: &Html) -> Result<Option<Value>> {
        let mut first = None;
        for script in document.select(&LINKED_DATA_SELECTOR) {
            let raw: String = script.text().collect();
            if raw.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(raw.trim())
                .map_err(|e| ScraperError::LinkedData(e.to_string()))?;
            if is_job_posting(&value) {
                return Ok(Some(value));
            }
            first.get_or_insert(value);
        }
        Ok(first)
    }

    fn apply_linked_data(data: &mut JobPostData, posting: &Value) {
        data.title = str_field(posting, "title");
        data.description = str_field(posting, "description");
        data.employment_type = str_field(posting, "employmentType");
        data.date_posted = str_field(posting, "datePosted");
        data.valid_through = str_field(posting, "validThrough");
        data.experience_level = list_field(posting, "experienceRequirements");
        data.industry = str_field(posting, "industry");
        data.skills = list_field(posting, "skills");
        data.job_benefits = list_field(posting, "jobBenefits");
        if let Some(org) = posting.get("hiringOrganization") {
            data.company_name = str_field(org, "name");
            data.company_description = str_field(org, "description");
            data.company_site_url = str_field(org, "sameAs");
        }
        data.base_salary = base_salary(posting);
        data.locations = job_locations(posting);
    }

    fn header_items(document: &Html) -> BTreeMap<String, String> {
        let mut items = BTreeMap::new();
        // The site navigation is also a <header>, so only fall back to the
        // first one when the page has no job details header
        let header = document
            .select(&JOB_DETAILS_HEADER_SELECTOR)
            .next()
            .or_else(|| document.select(&HEADER_SELECTOR).next());
        let Some(header) = header else {
            return items;
        };
        // Any class of the element may carry the `-` prefix, e.g. "pr16 -salary"
        for item in header.select(&ANY_ELEMENT_SELECTOR) {
            let Some(key) = item
                .value()
                .classes()
                .find_map(|class| class.strip_prefix('-'))
                .filter(|key| !key.is_empty())
            else {
                continue;
            };
            let text = element_text(&item);
            if !text.is_empty() {
                items.entry(key.to_string()).or_insert(text);
            }
        }
        items
    }
}
