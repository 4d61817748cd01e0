//! Integration tests for query-gate.

pub mod common;
pub mod http_test;
pub mod postgres_test;
