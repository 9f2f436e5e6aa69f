//! A1-style cell reference arithmetic.

use regex::Regex;
use std::sync::OnceLock;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([1-9][0-9]*)$").expect("reference pattern"))
}

/// Converts a column letter sequence to a 0-based column index ("A" = 0, "AB" = 27).
pub(crate) fn column_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for letter in letters.chars() {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (letter.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(index - 1)
}

/// Parses an A1-style reference into 0-based (row, col) indexes.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let captures = reference_pattern().captures(reference)?;
    let col = column_to_index(captures.get(1)?.as_str())?;
    let row = captures.get(2)?.as_str().parse::<usize>().ok()? - 1;
    Some((row, col))
}
