//! Currency reference data, rate caching and conversion

pub mod cache;
pub mod converter;
pub mod table;

pub use cache::{RateCache, RateSource};
pub use converter::{round_converted, Conversion, CurrencyConverter};
pub use table::{CurrencyTable, SymbolOverride, SYMBOL_OVERRIDES};
