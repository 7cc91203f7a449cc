//! Text folding used for every accent- and case-insensitive comparison.

use std::borrow::Cow;

use deunicode::deunicode;

/// Lowercase, trimmed, ASCII-transliterated form used for matching.
///
/// `"  Café Molido "` and `"CAFE molido"` both fold to `"cafe molido"`.
pub fn normalize(text: &str) -> String {
    let lowered = lowercase(trim(text).as_ref()).into_owned();
    fold_accents(&lowered).into_owned()
}

/// Transliterates non-ASCII characters, borrowing when the input is plain ASCII.
pub fn fold_accents(input: &str) -> Cow<'_, str> {
    if input.is_ascii() {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(deunicode(input))
    }
}

pub fn lowercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_uppercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_lowercase())
    }
}

/// Uppercases with full Unicode rules, so display labels keep their accents.
pub fn uppercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_lowercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_uppercase())
    }
}

pub fn trim(input: &str) -> Cow<'_, str> {
    Cow::Borrowed(input.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_accents_and_whitespace() {
        assert_eq!(normalize("  Café Molido "), "cafe molido");
        assert_eq!(normalize("QUÉSO"), "queso");
        assert_eq!(normalize("Maní"), "mani");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn uppercase_keeps_accents_for_display() {
        assert_eq!(uppercase("Lácteos"), "LÁCTEOS");
        assert!(matches!(uppercase("OTROS"), Cow::Borrowed(_)));
    }

    #[test]
    fn fold_accents_borrows_ascii() {
        assert!(matches!(fold_accents("plain"), Cow::Borrowed(_)));
        assert_eq!(fold_accents("ñandú"), "nandu");
    }
}
