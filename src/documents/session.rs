//! Council-session numbering: roman/arabic conversion and extraction.
//!
//! Sessions are written either way ("XXIII sesja", "sesji nr 23"), so
//! both forms are normalised to an arabic `u32` before comparison.

use crate::text::{is_stopword, tokenize};

/// Largest value representable with standard roman numerals.
pub const MAX_NUMERAL: u32 = 3999;

/// Largest session number accepted by extraction. Keeps words that happen
/// to be valid numerals ("cd", "mi") from being read as sessions.
pub const MAX_SESSION_NUMBER: u32 = 200;

const NUMERALS: &[(u32, &str)] = &[
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Words that sit between "sesja" and its number.
const NUMBER_PREFIXES: &[&str] = &["nr", "numer", "no"];

/// Encode `n` as a canonical roman numeral. `None` outside `1..=3999`.
pub fn arabic_to_session_numeral(n: u32) -> Option<String> {
    if n == 0 || n > MAX_NUMERAL {
        return None;
    }
    let mut rest = n;
    let mut out = String::new();
    for &(value, symbol) in NUMERALS {
        while rest >= value {
            out.push_str(symbol);
            rest -= value;
        }
    }
    Some(out)
}

/// Decode a session numeral, roman (any case) or arabic, to a number.
///
/// Roman input must be canonical: "IIII" or "IC" are rejected so that
/// decoding and re-encoding always agree. A trailing `.` is tolerated
/// ("23.", "XXIII.").
pub fn session_numeral_to_arabic(raw: &str) -> Option<u32> {
    let token = raw.trim().trim_end_matches('.');
    if token.is_empty() {
        return None;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse::<u32>().ok().filter(|n| (1..=MAX_NUMERAL).contains(n));
    }

    let upper = token.to_ascii_uppercase();
    let mut total: u32 = 0;
    let mut prev: u32 = 0;
    for c in upper.chars().rev() {
        let value = roman_digit(c)?;
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
            prev = value;
        }
    }

    let canonical = arabic_to_session_numeral(total)?;
    (canonical == upper).then_some(total)
}

fn roman_digit(c: char) -> Option<u32> {
    match c {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

fn session_token(token: &str) -> Option<u32> {
    session_numeral_to_arabic(token).filter(|n| *n <= MAX_SESSION_NUMBER)
}

/// Extract a session number from free text.
///
/// Recognises "sesja nr XXIII", "sesji 23", "XXIII sesja", "23. sesja" and
/// "sesja nadzwyczajna nr 5" (a `nr` within four words of the keyword).
pub fn extract_session_number(text: &str) -> Option<u32> {
    let tokens = tokenize(text);
    for (i, token) in tokens.iter().enumerate() {
        if !token.starts_with("sesj") {
            continue;
        }

        if let Some(next) = tokens.get(i + 1) {
            if let Some(n) = session_token(next) {
                return Some(n);
            }
        }

        let window_end = (i + 5).min(tokens.len());
        for j in (i + 1)..window_end {
            if NUMBER_PREFIXES.contains(&tokens[j].as_str()) {
                if let Some(n) = tokens.get(j + 1).and_then(|t| session_token(t)) {
                    return Some(n);
                }
            }
        }

        if i > 0 {
            let prev = &tokens[i - 1];
            if !is_stopword(prev) {
                if let Some(n) = session_token(prev) {
                    return Some(n);
                }
            }
        }
    }
    None
}
