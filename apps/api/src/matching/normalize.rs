/// Folds text for punctuation-insensitive comparison.
///
/// Keeps ASCII letters, digits and whitespace, collapses whitespace runs to a
/// single space, trims, and lowercases. `"Arts & Design!!"` becomes
/// `"arts design"`.
pub fn normalize_text(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation_and_folds_case() {
        assert_eq!(normalize_text("Arts & Design!!"), "arts design");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(normalize_text("   Software Engineer \n"), "software engineer");
    }

    #[test]
    fn test_empty_and_symbol_only_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("&&!!"), "");
    }

    #[test]
    fn test_non_ascii_letters_are_dropped() {
        assert_eq!(normalize_text("Café Owner"), "caf owner");
    }

    #[test]
    fn test_digits_survive() {
        assert_eq!(normalize_text("Level-3 Tech"), "level3 tech");
    }
}
