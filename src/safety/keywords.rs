//! Whole-word keyword blocklist.

use regex::Regex;
use std::sync::LazyLock;

/// Verbs that may not appear as whole words in a read-only query.
pub const BLOCKED_KEYWORDS: [&str; 10] = [
    "INSERT", "DELETE", "UPDATE", "CREATE", "DROP", "ALTER", "EXECUTE", "MERGE", "REPLACE",
    "TRUNCATE",
];

static BLOCKLIST: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    BLOCKED_KEYWORDS
        .iter()
        .map(|keyword| {
            let pattern = format!(r"(?i)\b{keyword}\b");
            // Patterns are built from the constant list above and always compile.
            let regex = Regex::new(&pattern).expect("blocklist pattern is valid");
            (*keyword, regex)
        })
        .collect()
});

/// Returns the first blocked keyword (in blocklist order) found as a whole word.
pub fn find_blocked_keyword(query: &str) -> Option<&'static str> {
    BLOCKLIST
        .iter()
        .find(|(_, regex)| regex.is_match(query))
        .map(|(keyword, _)| *keyword)
}
