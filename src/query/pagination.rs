//! Pagination parameters and the LIMIT/OFFSET rewriter.

use serde::Serialize;
use std::fmt;

/// Smallest accepted page size.
pub const MIN_LIMIT: i64 = 1;

/// Largest accepted page size.
pub const MAX_LIMIT: i64 = 100;

/// Page size used when the caller does not send one.
pub const DEFAULT_LIMIT: u32 = 10;

/// Validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationParams {
    limit: u32,
    offset: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PaginationParams {
    /// Builds a page window from raw request values, applying defaults for
    /// missing values and rejecting anything out of range.
    pub fn from_raw(
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> std::result::Result<Self, PaginationError> {
        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(v) if (MIN_LIMIT..=MAX_LIMIT).contains(&v) => v as u32,
            Some(v) => return Err(PaginationError::LimitOutOfRange(v)),
        };
        let offset = match offset {
            None => 0,
            Some(v) if v >= 0 => v as u64,
            Some(v) => return Err(PaginationError::NegativeOffset(v)),
        };
        Ok(Self { limit, offset })
    }

    /// Parses raw query-string values, then applies [`Self::from_raw`].
    ///
    /// Surrounding whitespace is ignored. Values that are not integers, or do
    /// not fit in 64 bits, are rejected.
    pub fn parse(
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> std::result::Result<Self, PaginationError> {
        let limit = limit
            .map(|v| v.trim().parse::<i64>().map_err(|_| PaginationError::InvalidLimit))
            .transpose()?;
        let offset = offset
            .map(|v| v.trim().parse::<i64>().map_err(|_| PaginationError::InvalidOffset))
            .transpose()?;
        Self::from_raw(limit, offset)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Malformed or out-of-range pagination input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationError {
    InvalidLimit,
    InvalidOffset,
    LimitOutOfRange(i64),
    NegativeOffset(i64),
}

impl PaginationError {
    /// Name of the offending query parameter.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidLimit | Self::LimitOutOfRange(_) => "limit",
            Self::InvalidOffset | Self::NegativeOffset(_) => "offset",
        }
    }

    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidLimit | Self::InvalidOffset => "int_parsing",
            Self::LimitOutOfRange(v) if *v < MIN_LIMIT => "greater_than_equal",
            Self::LimitOutOfRange(_) => "less_than_equal",
            Self::NegativeOffset(_) => "greater_than_equal",
        }
    }
}

impl fmt::Display for PaginationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLimit | Self::InvalidOffset => write!(
                f,
                "Input should be a valid integer, unable to parse string as an integer"
            ),
            Self::LimitOutOfRange(v) if *v < MIN_LIMIT => {
                write!(f, "Input should be greater than or equal to {MIN_LIMIT}")
            }
            Self::LimitOutOfRange(_) => {
                write!(f, "Input should be less than or equal to {MAX_LIMIT}")
            }
            Self::NegativeOffset(_) => write!(f, "Input should be greater than or equal to 0"),
        }
    }
}

impl std::error::Error for PaginationError {}

/// Appends a LIMIT/OFFSET clause to an already-validated query.
///
/// Existing LIMIT or OFFSET clauses are not detected; a query that already
/// has one ends up with two.
pub fn paginate(query: &str, limit: u32, offset: u64) -> String {
    format!("{} LIMIT {limit} OFFSET {offset}", query.trim_end())
}
