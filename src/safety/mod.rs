//! Read-only query gate.
//!
//! Classifies raw SQL text as a permitted read-only SELECT or not, using a
//! prefix check plus a whole-word keyword blocklist. No parsing is done: the
//! gate looks at surface text only.

mod keywords;

pub use keywords::{find_blocked_keyword, BLOCKED_KEYWORDS};

use std::fmt;

/// Outcome of classifying a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The query starts with SELECT and contains no blocked keyword.
    ReadOnly,
    /// The trimmed query does not start with SELECT.
    NotSelect,
    /// A blocked keyword appears as a whole word somewhere in the text.
    Blocked(&'static str),
}

impl Verdict {
    /// Returns true if the query may be executed.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::NotSelect => write!(f, "not a SELECT"),
            Self::Blocked(keyword) => write!(f, "blocked keyword {keyword}"),
        }
    }
}

/// Classifies a query against the read-only policy.
pub fn classify(query: &str) -> Verdict {
    if !starts_with_select(query) {
        return Verdict::NotSelect;
    }
    match find_blocked_keyword(query) {
        Some(keyword) => Verdict::Blocked(keyword),
        None => Verdict::ReadOnly,
    }
}

/// Returns true if the query is a permitted read-only SELECT.
pub fn is_read_only(query: &str) -> bool {
    classify(query).is_read_only()
}

fn starts_with_select(query: &str) -> bool {
    query
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("select"))
}
