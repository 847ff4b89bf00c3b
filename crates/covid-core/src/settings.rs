use std::path::PathBuf;
use std::sync::OnceLock;

use clap::Parser;
use regex::Regex;

use crate::error::{CovidError, Result};
use crate::models::{BucketMode, ErrorPolicy, Filter};

/// Upstream location of the RKI infection-count file.
pub const RKI_RAW_DATA_URL: &str = "https://media.githubusercontent.com/media/robert-koch-institut/SARS-CoV-2_Infektionen_in_Deutschland/master/Aktuell_Deutschland_SarsCov2_Infektionen.csv";

/// File name used for the local copy of [`RKI_RAW_DATA_URL`].
pub const CACHE_FILE_NAME: &str = "Aktuell_Deutschland_SarsCov2_Infektionen.csv";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Aggregate German SARS-CoV-2 case counts by age group
#[derive(Parser, Debug, Clone)]
#[command(
    name = "covid-stats",
    about = "Aggregate German SARS-CoV-2 case counts by age group",
    version
)]
pub struct Settings {
    /// German region code, e.g. 08222 for Mannheim
    #[arg(long)]
    pub region: Option<String>,

    /// Age group, e.g. A05-A14
    #[arg(long)]
    pub age_group: Option<String>,

    /// Only count cases reported in this year (four digits)
    #[arg(long)]
    pub year: Option<String>,

    /// Aggregate cases by month
    #[arg(long)]
    pub aggregate_month: bool,

    /// Aggregate cases by year
    #[arg(long)]
    pub aggregate_year: bool,

    /// Download the data again even if a cached copy exists
    #[arg(long)]
    pub update: bool,

    /// Read records from a local file instead of the cached download
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Upstream URL of the raw data file
    #[arg(long, default_value = RKI_RAW_DATA_URL)]
    pub url: String,

    /// Location of the cached download
    #[arg(long)]
    pub cache_file: Option<PathBuf>,

    /// Column delimiter of the data file
    #[arg(long, default_value = ",")]
    pub delimiter: char,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub output: String,

    /// Skip malformed rows with a warning instead of aborting
    #[arg(long)]
    pub skip_malformed: bool,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Query ──────────────────────────────────────────────────────────────────────

/// Validated aggregation parameters derived from [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub filter: Filter,
    pub bucket_mode: BucketMode,
    pub policy: ErrorPolicy,
    /// Field separator as the single byte the CSV reader expects.
    pub delimiter: u8,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            bucket_mode: BucketMode::default(),
            policy: ErrorPolicy::default(),
            delimiter: b',',
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] but with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Validate the filter, bucketing and delimiter flags.
    ///
    /// Runs before any I/O so configuration mistakes never touch the source.
    pub fn query(&self) -> Result<Query> {
        let bucket_mode = match (self.aggregate_month, self.aggregate_year) {
            (true, true) => return Err(CovidError::ConflictingBucketModes),
            (true, false) => BucketMode::Month,
            (false, true) => BucketMode::Year,
            (false, false) => BucketMode::None,
        };

        let filter = Filter::new(
            self.region.clone(),
            self.age_group.clone(),
            self.year.clone(),
        );
        if let Some(year) = &filter.year {
            if !year_pattern().is_match(year) {
                return Err(CovidError::InvalidYear(year.clone()));
            }
        }

        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or(CovidError::InvalidDelimiter(self.delimiter))?;

        let policy = if self.skip_malformed {
            ErrorPolicy::SkipAndWarn
        } else {
            ErrorPolicy::Abort
        };

        Ok(Query {
            filter,
            bucket_mode,
            policy,
            delimiter,
        })
    }

    /// Path of the cached download: `--cache-file`, or
    /// `<cache dir>/covid-stats/<file name>`.
    pub fn cache_path(&self) -> PathBuf {
        match &self.cache_file {
            Some(path) => path.clone(),
            None => default_cache_path(),
        }
    }

    /// `true` when the JSON report was requested.
    pub fn wants_json(&self) -> bool {
        self.output == "json"
    }
}

/// Default location of the raw-data cache.
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("covid-stats")
        .join(CACHE_FILE_NAME)
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}$").expect("regex is valid"))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
