use fractic_server_error::ServerError;
use regex::{escape, Regex};

use crate::errors::InvalidSearchQuery;

/// Longer queries are cut to this many characters before variants are
/// generated; the alternation grows quadratically with query length.
const MAX_QUERY_CHARS: usize = 64;

/// Typo-tolerant, case-insensitive substring matcher.
///
/// A text matches if it contains the query, or the query with any single
/// character replaced by an arbitrary one.
pub(crate) struct FuzzyMatcher {
    pattern: Regex,
}

/// Builds the alternation `query|.uery|q.ery|...|quer.` with every literal
/// part escaped.
pub(crate) fn fuzzy_pattern(query: &str) -> String {
    let chars: Vec<char> = query.trim().chars().take(MAX_QUERY_CHARS).collect();
    if chars.is_empty() {
        return String::new();
    }
    let literal = |cs: &[char]| escape(&cs.iter().collect::<String>());

    let mut variants = vec![literal(&chars)];
    for i in 0..chars.len() {
        variants.push(format!(
            "{}.{}",
            literal(&chars[..i]),
            literal(&chars[i + 1..])
        ));
    }
    format!("(?i)(?:{})", variants.join("|"))
}

impl FuzzyMatcher {
    pub(crate) fn new(query: &str) -> Result<Self, ServerError> {
        let pattern =
            Regex::new(&fuzzy_pattern(query)).map_err(|e| InvalidSearchQuery::with_debug(query, &e))?;
        Ok(Self { pattern })
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}
