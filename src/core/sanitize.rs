// src/core/sanitize.rs
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Strip accents: "Özütok" → "Ozutok".
pub fn fold_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Roster key form of a name: folded, lowercase, no whitespace.
/// "Van Baarle" → "vanbaarle", "El Abassi" → "elabassi".
pub fn normalize_key(s: &str) -> String {
    fold_diacritics(s)
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Split an attendance sentence into name tokens.
///
/// Lowercases, turns the infix " en " into a comma, drops whitespace and
/// trailing separators, then splits on commas. Empty pieces are dropped.
pub fn tokenize(list: &str) -> Vec<String> {
    let lowered = normalize_ws(&fold_diacritics(list)).to_lowercase();
    let joined = lowered.replace(" en ", ",");
    let squashed: String = joined.chars().filter(|c| !c.is_whitespace()).collect();
    squashed
        .trim_end_matches([',', '.'])
        .split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
