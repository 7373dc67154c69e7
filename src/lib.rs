pub mod config;
pub mod constants;
pub mod currency;
pub mod error;
pub mod job_post;
pub mod salary;
pub mod stats;
pub mod types;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub mod observability;

pub use error::{Result, SalaryError, ScraperError};
pub use salary::SalaryNormalizer;
pub use types::{CurrencyEntry, ParsedSalary};
