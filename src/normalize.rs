// 🔤 Normalization - Comparison keys for pasted text
// Plates, driver names and cities are compared through normalize_key();
// the original text is always kept for display.

use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block (U+0300 - U+036F)
fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Build a comparison-safe key: trim, uppercase, decompose (NFD) and
/// strip combining marks.
///
/// "São Paulo", "sao paulo " and "SAO PAULO" all produce "SAO PAULO".
pub fn normalize_key(value: &str) -> String {
    value
        .trim()
        .to_uppercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
