pub mod ndjson_output;
pub mod rate_api;
pub mod static_rates;

pub use ndjson_output::NdjsonOutput;
pub use rate_api::HttpRateLookup;
pub use static_rates::StaticRateLookup;
