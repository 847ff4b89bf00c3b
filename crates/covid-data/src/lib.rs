//! Data ingestion layer for covid-stats.
//!
//! Responsible for opening the raw infection-count file (locally or through
//! a cached download), streaming its rows as records and aggregating them
//! into a count matrix.

pub mod aggregator;
pub mod reader;
pub mod source;

pub use covid_core as core;
