//! Case aggregation by age group and time bucket.
//!
//! One pass over a record sequence: filter, derive the bucket key, grow the
//! age-group header and accumulate into a [`CountMatrix`]. The accumulator
//! is owned by the call and returned by value.

use covid_core::error::{CovidError, Result};
use covid_core::matrix::{AgeGroupHeader, CountMatrix};
use covid_core::models::{BucketMode, ErrorPolicy, Filter, Record};
use covid_core::settings::Query;
use tracing::{debug, warn};

use crate::reader::RecordStream;
use crate::source::DataSource;

// ── AggregationResult ─────────────────────────────────────────────────────────

/// Everything one aggregation run produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationResult {
    pub matrix: CountMatrix,
    pub header: AgeGroupHeader,
    /// Data rows pulled from the stream, malformed ones included.
    pub rows_read: u64,
    /// Rows that passed the filter.
    pub rows_matched: u64,
    /// One entry per skipped row under [`ErrorPolicy::SkipAndWarn`].
    pub warnings: Vec<String>,
}

impl AggregationResult {
    /// Fold a partial result into this one.
    pub fn merge(&mut self, other: AggregationResult) {
        self.matrix.merge(other.matrix);
        self.header.merge(&other.header);
        self.rows_read += other.rows_read;
        self.rows_matched += other.rows_matched;
        self.warnings.extend(other.warnings);
    }
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Filter + bucketing configuration for one or more aggregation runs.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    filter: Filter,
    bucket_mode: BucketMode,
    policy: ErrorPolicy,
}

impl Aggregator {
    pub fn new(filter: Filter, bucket_mode: BucketMode) -> Self {
        Self {
            filter,
            bucket_mode,
            policy: ErrorPolicy::Abort,
        }
    }

    pub fn from_query(query: &Query) -> Self {
        Self::new(query.filter.clone(), query.bucket_mode).with_policy(query.policy)
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Consume `records` and build the count matrix.
    ///
    /// Under [`ErrorPolicy::Abort`] the first error ends the run and nothing
    /// partial is returned. Under [`ErrorPolicy::SkipAndWarn`] malformed
    /// records are skipped; I/O errors still abort.
    pub fn aggregate<I>(&self, records: I) -> Result<AggregationResult>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let mut result = AggregationResult::default();

        for item in records {
            result.rows_read += 1;
            let record = match item {
                Ok(record) => record,
                Err(err @ CovidError::MalformedRecord { .. })
                    if self.policy == ErrorPolicy::SkipAndWarn =>
                {
                    warn!("skipping row: {}", err);
                    result.warnings.push(err.to_string());
                    continue;
                }
                Err(err) => return Err(err),
            };

            if !self.filter.matches(&record) {
                continue;
            }
            result.rows_matched += 1;

            let bucket = self.bucket_mode.bucket_key(&record);
            result.header.insert(&record.age_group);
            result
                .matrix
                .add(bucket.as_deref(), &record.age_group, record.case_count);
        }

        debug!(
            "Aggregated {} of {} rows into {} buckets ({} age groups, {} skipped)",
            result.rows_matched,
            result.rows_read,
            result.matrix.period_count(),
            result.header.len(),
            result.warnings.len(),
        );

        Ok(result)
    }

    /// Open `source` and aggregate its rows, split on `delimiter`.
    pub fn aggregate_source(
        &self,
        source: &mut dyn DataSource,
        delimiter: u8,
    ) -> Result<AggregationResult> {
        debug!(
            "Aggregating {} (bucket mode: {})",
            source.describe(),
            self.bucket_mode
        );
        let reader = source.open()?;
        self.aggregate(RecordStream::with_delimiter(reader, delimiter))
    }
}

/// Aggregate `records` with `filter` and `bucket_mode`, aborting on the first
/// malformed record.
pub fn aggregate<I>(
    records: I,
    filter: &Filter,
    bucket_mode: BucketMode,
) -> Result<(CountMatrix, AgeGroupHeader)>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let result = Aggregator::new(filter.clone(), bucket_mode).aggregate(records)?;
    Ok((result.matrix, result.header))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
