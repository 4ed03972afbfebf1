//! Input normalization and tokenization.

use std::collections::HashSet;

/// Lower-case the input and strip everything that is not a word character
/// or whitespace. Punctuation disappears, so "pendaftaran?" and
/// "pendaftaran" normalize identically.
pub fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect()
}

/// Split normalized text into a token set. Duplicates collapse — token
/// order and multiplicity never influence scoring.
pub fn tokenize(normalized: &str) -> HashSet<String> {
    normalized
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Bagaimana cara pendaftaran?!"), "bagaimana cara pendaftaran");
        assert_eq!(normalize("biaya-kuliah (per semester)"), "biayakuliah per semester");
    }

    #[test]
    fn test_normalize_keeps_underscores_and_digits() {
        assert_eq!(normalize("S1_Informatika 2024"), "s1_informatika 2024");
    }

    #[test]
    fn test_tokenize_collapses_duplicates() {
        let tokens = tokenize("cara cara daftar");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("cara"));
        assert!(tokens.contains("daftar"));
    }

    #[test]
    fn test_tokenize_whitespace_only() {
        assert!(tokenize("   ").is_empty());
    }
}
