/// Isolate the currency symbol at the beginning of a salary range.
///
/// The symbol is the leading run of non-digit characters, trimmed. `offset` is
/// the byte index of the first digit, so `&text[offset..]` is the amount part.
/// Returns `None` when the text starts with a digit or has no symbol.
pub fn extract_currency_symbol(text: &str) -> Option<(&str, usize)> {
    let offset = text
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    let symbol = text[..offset].trim();
    if symbol.is_empty() {
        return None;
    }
    Some((symbol, offset))
}
