//! Canonicalization of free-text categorical fields.
//!
//! Applied to every value before it is used as a grouping key, so that
//! "SÃO PAULO", "Sao Paulo" and "são paulo" land in one group, and so do
//! "Zona III" and "Zona 3".

use std::sync::LazyLock;

use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization as _;

/// Matches any run of non-whitespace characters. Whitespace between the
/// matches is left untouched by `replace_all`.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("valid regex"));

/// A token made only of roman-numeral letters, up to ten of them.
static ROMAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ivxlcdmIVXLCDM]{1,10}$").expect("valid regex"));

/// Combining diacritical marks block, stripped after NFD.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

const fn roman_value(letter: char) -> i64 {
    match letter {
        'i' => 1,
        'v' => 5,
        'x' => 10,
        'l' => 50,
        'c' => 100,
        'd' => 500,
        'm' => 1000,
        _ => 0,
    }
}

/// Converts a roman-numeral token to its arabic value.
///
/// Returns `None` when the token is not one to ten letters from
/// `IVXLCDM` (either case). Letters are read right to left; a letter
/// smaller than the largest one seen so far is subtracted. Malformed
/// sequences such as `DDM` can therefore come out negative.
///
/// Ordinary words made of those letters ("MIX", "DI") are converted too.
#[must_use]
pub fn roman_to_arabic(token: &str) -> Option<i64> {
    if !ROMAN_RE.is_match(token) {
        return None;
    }

    let mut total = 0i64;
    let mut max_seen = 0i64;

    for letter in token.chars().rev() {
        let value = roman_value(letter.to_ascii_lowercase());
        if value < max_seen {
            total -= value;
        } else {
            total += value;
            max_seen = value;
        }
    }

    Some(total)
}

/// Normalizes a text value into its canonical grouping key.
///
/// The pipeline:
/// 1. Replace roman-numeral tokens with arabic digits
/// 2. Decompose (NFD) and strip combining marks
/// 3. Lowercase
/// 4. Trim
///
/// Never fails; an empty input yields an empty key.
#[must_use]
pub fn normalize(text: &str) -> String {
    let arabic = TOKEN_RE.replace_all(text, |caps: &Captures<'_>| {
        let token = &caps[0];
        roman_to_arabic(token).map_or_else(|| token.to_string(), |value| value.to_string())
    });

    let stripped: String = arabic
        .nfd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .collect();

    stripped.to_lowercase().trim().to_string()
}
