//! Text normalization for portal labels and extracted document values.
//!
//! Two profiles are provided. The display profile only cleans up invisible
//! characters and whitespace, so the result is still fit to show or to type
//! into a form. The comparison profile builds on it to produce a key suitable
//! for equality and containment checks between grid labels and survey numbers.
//! Both are pure and idempotent.

/// Characters that render as nothing but break equality checks.
const INVISIBLE: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Punctuation dropped from comparison keys.
const KEY_PUNCTUATION: &[char] = &['-', '(', ')', '.', ':', '/'];

/// Strips zero-width characters, maps non-breaking spaces to plain spaces,
/// collapses whitespace runs to a single space and trims.
#[must_use]
pub fn normalize_display(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;

    for c in s.chars() {
        if INVISIBLE.contains(&c) {
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}

/// Comparison key: display profile, Devanagari digits folded to ASCII,
/// whitespace and `- ( ) . : /` removed, lowercased.
#[must_use]
pub fn normalize_key(s: &str) -> String {
    fold_digits(&normalize_display(s))
        .chars()
        .filter(|c| !c.is_whitespace() && !KEY_PUNCTUATION.contains(c))
        .collect::<String>()
        .to_lowercase()
}

/// Maps Devanagari digits (`०`–`९`) to their ASCII counterparts.
#[must_use]
pub fn fold_digits(s: &str) -> String {
    s.chars().map(fold_digit).collect()
}

fn fold_digit(c: char) -> char {
    match c {
        '\u{0966}'..='\u{096F}' => {
            let offset = u32::from(c) - 0x0966;
            char::from_digit(offset, 10).unwrap_or(c)
        }
        _ => c,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
