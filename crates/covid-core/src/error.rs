use thiserror::Error;

/// All errors produced while building a case report.
#[derive(Error, Debug)]
pub enum CovidError {
    /// The data source could not supply a readable stream.
    #[error("Data source unavailable at {location}: {source}")]
    SourceUnavailable {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Fetching the upstream file failed after all retry attempts.
    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    /// A row had too few columns, an unparsable count or an unusable date.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// Month and year bucketing were requested together.
    #[error("Configuration error: --aggregate-month and --aggregate-year are mutually exclusive")]
    ConflictingBucketModes,

    /// The year filter is not a four-digit year.
    #[error("Invalid year filter: {0} (expected four digits, e.g. 2021)")]
    InvalidYear(String),

    /// The column delimiter is not a single ASCII character.
    #[error("Invalid delimiter: {0:?} (expected a single ASCII character)")]
    InvalidDelimiter(char),

    /// The JSON report could not be serialised.
    #[error("Failed to serialise JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a location.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CovidError {
    /// Shorthand for a [`CovidError::MalformedRecord`].
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the covid-stats crates.
pub type Result<T> = std::result::Result<T, CovidError>;
