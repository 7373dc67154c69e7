use crate::error::{Result, SalaryError, ScraperError};
use crate::types::CurrencyEntry;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const BUNDLED_CURRENCIES: &str = include_str!("../../data/currencies.json");

/// Policy entry resolving a symbol that the reference table cannot resolve on
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolOverride {
    pub symbol: &'static str,
    pub code: &'static str,
    /// Applies even when the table has exactly one entry for the symbol
    pub forced: bool,
}

/// Symbol-to-code overrides. This is a lossy many-to-one mapping chosen for
/// job posts, not a parsing rule.
pub const SYMBOL_OVERRIDES: &[SymbolOverride] = &[
    // Official symbol of the Nicaraguan córdoba, but job posts use it for the Canadian dollar
    SymbolOverride { symbol: "C$", code: "CAD", forced: true },
    SymbolOverride { symbol: "A$", code: "AUD", forced: false },
    // Also EGP, FKP, GIP, LBP, SHP
    SymbolOverride { symbol: "£", code: "GBP", forced: false },
    SymbolOverride { symbol: "$", code: "USD", forced: false },
];

fn override_for(symbol: &str) -> Option<&'static SymbolOverride> {
    SYMBOL_OVERRIDES.iter().find(|o| o.symbol == symbol)
}

/// Immutable currency reference table, loaded once per process
#[derive(Debug, Clone)]
pub struct CurrencyTable {
    entries: Vec<CurrencyEntry>,
}

impl CurrencyTable {
    pub fn new(entries: Vec<CurrencyEntry>) -> Self {
        Self { entries }
    }

    /// Table compiled into the binary from `data/currencies.json`
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CURRENCIES)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CurrencyEntry> = serde_json::from_str(json)?;
        if entries.is_empty() {
            return Err(ScraperError::CurrencyTable(
                "currency table has no entries".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::CurrencyTable(format!(
                "Failed to read currency file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let table = Self::from_json(&content)?;
        info!("Loaded {} currencies from {}", table.len(), path.display());
        Ok(table)
    }

    /// Load from `path` when given, otherwise use the bundled table
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::bundled(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CurrencyEntry] {
        &self.entries
    }

    pub fn by_code(&self, code: &str) -> Option<&CurrencyEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// All entries sharing `symbol`
    pub fn matching_symbol<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a CurrencyEntry> {
        self.entries.iter().filter(move |e| e.symbol == symbol)
    }

    /// Resolve a currency symbol into a currency code.
    ///
    /// A symbol with exactly one table entry resolves to it, unless a forced
    /// override exists. Otherwise the override table decides, and a symbol
    /// with no override is unresolved.
    pub fn symbol_to_code(&self, symbol: &str) -> std::result::Result<String, SalaryError> {
        let matches: Vec<&CurrencyEntry> = self.matching_symbol(symbol).collect();
        let policy = override_for(symbol);

        if matches.len() == 1 && !policy.is_some_and(|o| o.forced) {
            debug!(symbol, code = %matches[0].code, "Found a single currency code for symbol");
            return Ok(matches[0].code.clone());
        }

        match policy {
            Some(o) => {
                debug!(symbol, code = o.code, candidates = matches.len(), "Resolved symbol via override");
                Ok(o.code.to_string())
            }
            None => Err(SalaryError::AmbiguousOrUnknownSymbol {
                symbol: symbol.to_string(),
                candidates: matches.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> CurrencyTable {
        CurrencyTable::new(
            entries
                .iter()
                .map(|(code, symbol)| CurrencyEntry::new(code, symbol, code))
                .collect(),
        )
    }

    #[test]
    fn test_unique_symbol_resolves_to_its_code() {
        let t = table(&[("EUR", "€"), ("JPY", "¥"), ("INR", "₹")]);
        assert_eq!(t.symbol_to_code("€").unwrap(), "EUR");
        assert_eq!(t.symbol_to_code("₹").unwrap(), "INR");
    }

    #[test]
    fn test_canadian_dollar_beats_cordoba_in_any_order() {
        let nio_first = table(&[("NIO", "C$"), ("CAD", "$")]);
        let cad_first = table(&[("CAD", "$"), ("NIO", "C$")]);
        assert_eq!(nio_first.symbol_to_code("C$").unwrap(), "CAD");
        assert_eq!(cad_first.symbol_to_code("C$").unwrap(), "CAD");
    }

    #[test]
    fn test_pound_and_dollar_overrides_for_shared_symbols() {
        let t = table(&[("EGP", "£"), ("GBP", "£"), ("LBP", "£"), ("AUD", "$"), ("CAD", "$")]);
        assert_eq!(t.symbol_to_code("£").unwrap(), "GBP");
        assert_eq!(t.symbol_to_code("$").unwrap(), "USD");
        assert_eq!(t.symbol_to_code("A$").unwrap(), "AUD");
    }

    #[test]
    fn test_ambiguous_symbol_without_override_is_unresolved() {
        let t = table(&[("NOK", "kr"), ("SEK", "kr")]);
        let err = t.symbol_to_code("kr").unwrap_err();
        assert_eq!(
            err,
            SalaryError::AmbiguousOrUnknownSymbol { symbol: "kr".to_string(), candidates: 2 }
        );
    }

    #[test]
    fn test_unknown_symbol_is_unresolved() {
        let t = table(&[("EUR", "€")]);
        assert!(matches!(
            t.symbol_to_code("?"),
            Err(SalaryError::AmbiguousOrUnknownSymbol { candidates: 0, .. })
        ));
    }

    #[test]
    fn test_bundled_table_loads() {
        let t = CurrencyTable::bundled().unwrap();
        assert!(t.by_code("USD").is_some());
        assert_eq!(t.symbol_to_code("€").unwrap(), "EUR");
        assert_eq!(t.symbol_to_code("C$").unwrap(), "CAD");
    }

    #[test]
    fn test_from_path_accepts_code_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("currencies.json");
        fs::write(&path, r#"[{"code": "EUR", "symbol": "€", "name": "Euro"}]"#).unwrap();

        let t = CurrencyTable::load(Some(&path)).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.by_code("EUR").unwrap().name, "Euro");
    }

    #[test]
    fn test_empty_table_is_rejected() {
        assert!(matches!(
            CurrencyTable::from_json("[]"),
            Err(ScraperError::CurrencyTable(_))
        ));
    }
}
