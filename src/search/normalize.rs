use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9\s]+").expect("static pattern")
});

/// Lowercase, strip punctuation, collapse runs of whitespace.
/// "Ender's  Game!" and "enders game" normalize to the same string.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_ALPHANUMERIC.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized word list for token-level matching.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(|word| word.to_string())
        .collect()
}

/// Case-, punctuation- and whitespace-insensitive equality.
pub fn loosely_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Loose equality for person names, where "O.S. Card" and
/// "Orson Scott Card" refer to the same author. Names match when they
/// normalize identically, or share a surname and the leading part of one
/// is the other's initials (or absent entirely).
pub fn names_loosely_equal(a: &str, b: &str) -> bool {
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a == norm_b {
        return true;
    }

    let tokens_a: Vec<&str> = norm_a.split_whitespace().collect();
    let tokens_b: Vec<&str> = norm_b.split_whitespace().collect();
    let (Some(last_a), Some(last_b)) = (tokens_a.last(), tokens_b.last()) else {
        return false;
    };
    if last_a != last_b {
        return false;
    }

    let lead_a: String = tokens_a[..tokens_a.len() - 1].concat();
    let lead_b: String = tokens_b[..tokens_b.len() - 1].concat();
    if lead_a.is_empty() || lead_b.is_empty() {
        return true;
    }

    let initials_a: String = tokens_a[..tokens_a.len() - 1]
        .iter()
        .filter_map(|token| token.chars().next())
        .collect();
    let initials_b: String = tokens_b[..tokens_b.len() - 1]
        .iter()
        .filter_map(|token| token.chars().next())
        .collect();

    lead_a == initials_b || lead_b == initials_a
}
