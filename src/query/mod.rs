//! Query rewriting and execution for query-gate.
//!
//! This module isolates the pagination rewriter and the gated executor
//! from the HTTP layer.

pub mod executor;
pub mod pagination;

pub use executor::QueryExecutor;
pub use pagination::{paginate, PaginationError, PaginationParams};
