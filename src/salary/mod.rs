//! Free-text salary parsing and normalization into the destination currency

pub mod normalizer;
pub mod symbol;

pub use normalizer::{parse_bounds, split_equity, SalaryNormalizer};
pub use symbol::extract_currency_symbol;
