use serde::{Deserialize, Serialize};

/// One parsed row of the infection-count file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Opaque district identifier, e.g. `"08222"` for Mannheim.
    pub region_code: String,
    /// Age-group label with surrounding whitespace removed, e.g. `"A05-A14"`.
    pub age_group: String,
    /// Reporting date exactly as written in the source (`YYYY-MM-DD`).
    pub date: String,
    /// Number of cases reported by this row.
    pub case_count: i64,
    /// Number of deaths, when the column is present and numeric.
    pub death_count: Option<i64>,
}

impl Record {
    /// Year component of [`Record::date`], e.g. `"2021"`.
    pub fn year(&self) -> &str {
        self.date.split('-').next().unwrap_or_default()
    }

    /// Month component of [`Record::date`] with the source's own padding.
    ///
    /// The reader rejects dates without a month, so this is only empty for
    /// records built by hand.
    pub fn month(&self) -> &str {
        self.date.split('-').nth(1).unwrap_or_default()
    }
}

// ── BucketMode ────────────────────────────────────────────────────────────────

/// Time granularity used to derive a record's bucket key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketMode {
    /// Only the grand total is accumulated.
    #[default]
    None,
    /// One bucket per `"{year}-{month}"`.
    Month,
    /// One bucket per `"{year}"`.
    Year,
}

impl BucketMode {
    /// Derive the bucket key for `record`, or `None` in unbucketed mode.
    pub fn bucket_key(self, record: &Record) -> Option<String> {
        match self {
            BucketMode::None => None,
            BucketMode::Month => Some(format!("{}-{}", record.year(), record.month())),
            BucketMode::Year => Some(record.year().to_string()),
        }
    }
}

impl std::fmt::Display for BucketMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BucketMode::None => "none",
            BucketMode::Month => "month",
            BucketMode::Year => "year",
        };
        f.write_str(name)
    }
}

// ── Filter ────────────────────────────────────────────────────────────────────

/// Conjunction of optional equality constraints applied to every record.
///
/// An absent criterion matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub region_code: Option<String>,
    pub age_group: Option<String>,
    pub year: Option<String>,
}

impl Filter {
    /// Build a filter, treating empty strings as "no constraint".
    pub fn new(
        region_code: Option<String>,
        age_group: Option<String>,
        year: Option<String>,
    ) -> Self {
        Self {
            region_code: non_empty(region_code),
            age_group: non_empty(age_group),
            year: non_empty(year),
        }
    }

    pub fn with_region(mut self, region_code: impl Into<String>) -> Self {
        self.region_code = non_empty(Some(region_code.into()));
        self
    }

    pub fn with_age_group(mut self, age_group: impl Into<String>) -> Self {
        self.age_group = non_empty(Some(age_group.into()));
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = non_empty(Some(year.into()));
        self
    }

    /// `true` when no criterion is set.
    pub fn is_match_all(&self) -> bool {
        self.region_code.is_none() && self.age_group.is_none() && self.year.is_none()
    }

    /// Returns `true` when `record` satisfies every configured criterion.
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(region) = &self.region_code {
            if record.region_code != *region {
                return false;
            }
        }
        if let Some(age_group) = &self.age_group {
            if record.age_group != age_group.trim() {
                return false;
            }
        }
        if let Some(year) = &self.year {
            if record.year() != year {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ── ErrorPolicy ───────────────────────────────────────────────────────────────

/// What the aggregator does when the reader yields a malformed record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the whole run on the first malformed record.
    #[default]
    Abort,
    /// Skip the row, log a warning and keep aggregating.
    SkipAndWarn,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(region: &str, age: &str, date: &str, count: i64) -> Record {
        Record {
            region_code: region.to_string(),
            age_group: age.to_string(),
            date: date.to_string(),
            case_count: count,
            death_count: None,
        }
    }

    #[test]
    fn test_record_year_and_month() {
        let r = record("08221", "A00-A04", "2021-01-15", 3);
        assert_eq!(r.year(), "2021");
        assert_eq!(r.month(), "01");
    }

    #[test]
    fn test_record_month_keeps_source_padding() {
        let r = record("08221", "A00-A04", "2021-1-15", 3);
        assert_eq!(r.month(), "1");
    }

    #[test]
    fn test_record_month_missing() {
        let r = record("08221", "A00-A04", "2021", 3);
        assert_eq!(r.year(), "2021");
        assert_eq!(r.month(), "");
    }

    #[test]
    fn test_bucket_key_per_mode() {
        let r = record("08221", "A00-A04", "2021-02-01", 3);
        assert_eq!(BucketMode::None.bucket_key(&r), None);
        assert_eq!(BucketMode::Month.bucket_key(&r), Some("2021-02".to_string()));
        assert_eq!(BucketMode::Year.bucket_key(&r), Some("2021".to_string()));
    }

    #[test]
    fn test_bucket_mode_display() {
        assert_eq!(BucketMode::None.to_string(), "none");
        assert_eq!(BucketMode::Month.to_string(), "month");
        assert_eq!(BucketMode::Year.to_string(), "year");
    }

    #[test]
    fn test_filter_default_matches_everything() {
        let f = Filter::default();
        assert!(f.is_match_all());
        assert!(f.matches(&record("01001", "A80+", "2020-03-01", 1)));
    }

    #[test]
    fn test_filter_new_treats_empty_as_absent() {
        let f = Filter::new(Some(String::new()), Some("  ".to_string()), None);
        assert!(f.is_match_all());
    }

    #[test]
    fn test_filter_region() {
        let f = Filter::default().with_region("08221");
        assert!(f.matches(&record("08221", "A00-A04", "2021-01-15", 1)));
        assert!(!f.matches(&record("08222", "A00-A04", "2021-01-15", 1)));
    }

    #[test]
    fn test_filter_age_group_and_year() {
        let f = Filter::default().with_age_group("A05-A14").with_year("2021");
        assert!(f.matches(&record("08221", "A05-A14", "2021-06-01", 1)));
        assert!(!f.matches(&record("08221", "A05-A14", "2020-06-01", 1)));
        assert!(!f.matches(&record("08221", "A00-A04", "2021-06-01", 1)));
    }

    #[test]
    fn test_filter_unknown_age_group_is_a_plain_label() {
        let f = Filter::default().with_age_group("unbekannt");
        assert!(f.matches(&record("08221", "unbekannt", "2021-06-01", 1)));
    }
}
