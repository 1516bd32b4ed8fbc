//! Header normalization: raw header cell + column position -> stable column key.

/// Normalize a raw header cell into a column key.
///
/// - Blank (empty or whitespace-only) headers become `col_<position + 1>`.
/// - Otherwise each character of the trimmed text is lower-cased on its own (the first
///   character of its lower-case mapping), and every character that is not an ASCII lowercase
///   letter or digit is replaced by `_`. The key has exactly one character per input character.
///   Runs of separators are kept.
///
/// This never fails. Distinct headers may normalize to the same key; see
/// [`super::assembler::RowAssembler`] for how collisions are resolved.
pub fn normalize_header(raw: &str, position: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return format!("col_{}", position + 1);
    }

    trimmed
        .chars()
        .map(|c| match c.to_lowercase().next().unwrap_or(c) {
            l @ ('a'..='z' | '0'..='9') => l,
            _ => '_',
        })
        .collect()
}

/// Normalize every cell of a header row by position.
pub fn normalize_headers<S: AsRef<str>>(cells: &[S]) -> Vec<String> {
    cells
        .iter()
        .enumerate()
        .map(|(i, h)| normalize_header(h.as_ref(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_headers_get_positional_keys() {
        assert_eq!(normalize_header("", 0), "col_1");
        assert_eq!(normalize_header("   \t", 4), "col_5");
    }

    #[test]
    fn substitutes_without_collapsing() {
        assert_eq!(normalize_header("Fecha de Venta", 0), "fecha_de_venta");
        assert_eq!(normalize_header("  Total ($)  ", 0), "total____");
        assert_eq!(normalize_header("SKU-2024", 3), "sku_2024");
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        // One output char per lower-cased input char.
        assert_eq!(normalize_header("Año", 0), "a_o");
        assert_eq!(normalize_header("Descripción", 0), "descripci_n");
    }

    #[test]
    fn multi_char_lowercase_mappings_do_not_widen_keys() {
        // 'İ' lower-cases to "i\u{307}"; only the first char counts.
        let key = normalize_header("İSTANBUL", 0);
        assert_eq!(key, "istanbul");
        assert_eq!(key.chars().count(), "İSTANBUL".chars().count());
        assert_eq!(normalize_header("Straße", 0), "stra_e");
    }

    #[test]
    fn normalize_headers_uses_column_positions() {
        let keys = normalize_headers(&["Name", "", "Qty"]);
        assert_eq!(keys, vec!["name", "col_2", "qty"]);
    }
}
