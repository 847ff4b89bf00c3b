//! Domain types shared by the covid-stats crates.
//!
//! Holds the parsed [`models::Record`], the filter and bucketing rules, the
//! [`matrix::CountMatrix`] accumulator, the error type and CLI settings.

pub mod error;
pub mod matrix;
pub mod models;
pub mod settings;

pub use error::{CovidError, Result};
pub use matrix::{AgeGroupHeader, CountMatrix, SUM_KEY};
pub use models::{BucketMode, ErrorPolicy, Filter, Record};
