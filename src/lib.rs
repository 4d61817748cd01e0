//! query-gate - a guarded, read-only SQL execution gateway.
//!
//! Accepts SQL over HTTP, lets through only SELECT queries that carry no
//! write keyword, optionally paginates them, and returns rows as records.

pub mod audit;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod safety;
pub mod server;
