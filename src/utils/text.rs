use crate::error::{Result, SearchError};

/// Check that `text` only uses characters the index can store.
///
/// Control characters are rejected: they can't be typed into a search box
/// and a NUL would be ambiguous for the lookup script.
pub fn validate_text(text: &str) -> Result<()> {
    match text.char_indices().find(|(_, c)| c.is_control()) {
        Some((position, character)) => Err(SearchError::UnsupportedCharacter {
            text: text.to_string(),
            character,
            position,
        }),
        None => Ok(()),
    }
}

/// Normalize text for insertion into the trie or for a query
pub fn normalize_text(text: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        text.to_lowercase()
    } else {
        text.to_string()
    }
}

/// Scope-stripped suffixes of a qualified name.
///
/// `math::vector::min` with separator `::` yields `vector::min` and `min`,
/// so a symbol can be found without typing its enclosing scopes.
pub fn scope_suffixes<'a>(name: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return Vec::new();
    }

    name.match_indices(separator)
        .map(|(i, _)| &name[i + separator.len()..])
        .filter(|suffix| !suffix.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        assert!(validate_text("Math::Vector<T>::min()").is_ok());
        assert!(validate_text("hýždě").is_ok());
        assert!(validate_text("").is_ok());

        let err = validate_text("foo\tbar").unwrap_err();
        match err {
            SearchError::UnsupportedCharacter {
                character, position, ..
            } => {
                assert_eq!(character, '\t');
                assert_eq!(position, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(validate_text("nul\0").is_err());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("Math::Vector", true), "math::vector");
        assert_eq!(normalize_text("Math::Vector", false), "Math::Vector");
    }

    #[test]
    fn test_scope_suffixes() {
        assert_eq!(
            scope_suffixes("math::vector::min", "::"),
            vec!["vector::min", "min"]
        );
        assert!(scope_suffixes("min", "::").is_empty());
        assert!(scope_suffixes("trailing::", "::").is_empty());
        assert_eq!(scope_suffixes("a.b", "."), vec!["b"]);
        assert!(scope_suffixes("a.b", "").is_empty());
    }
}
