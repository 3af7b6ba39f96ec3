//! Token extraction and name matching.
//!
//! All offsets are in characters, not bytes.

/// The word being typed: the longest run of identifier characters that ends
/// at `caret`. Returns the token and its start offset.
pub fn token_at(draft: &str, caret: usize) -> (String, usize) {
    let before: Vec<char> = draft.chars().take(caret).collect();
    let start = before
        .iter()
        .rposition(|c| !is_token_char(*c))
        .map(|i| i + 1)
        .unwrap_or(0);
    (before[start..].iter().collect(), start)
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Case-insensitive prefix match.
pub fn is_prefix(query: &str, name: &str) -> bool {
    name.len() >= query.len()
        && name
            .chars()
            .zip(query.chars())
            .all(|(n, q)| n.eq_ignore_ascii_case(&q))
}

/// Case-insensitive subsequence match. Returns how many characters of `name`
/// were skipped before the last matched character, so denser matches score
/// lower.
pub fn subsequence_gap(query: &str, name: &str) -> Option<usize> {
    let mut wanted = query.chars().peekable();
    let mut last = 0;
    for (idx, c) in name.chars().enumerate() {
        let Some(q) = wanted.peek() else {
            break;
        };
        if c.eq_ignore_ascii_case(q) {
            wanted.next();
            last = idx;
        }
    }
    if wanted.peek().is_some() {
        return None;
    }
    Some((last + 1).saturating_sub(query.chars().count()))
}
