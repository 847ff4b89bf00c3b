//! Presentation layer for covid-stats.
//!
//! Sorts an aggregation result and renders it either as a column-aligned
//! text table or as JSON.

pub mod json_view;
pub mod table_view;

pub use covid_core as core;
