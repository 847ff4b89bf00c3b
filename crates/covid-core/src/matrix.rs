//! Two-level case-count accumulator and the age-group header.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// Reserved bucket key holding the grand total over all filtered records.
pub const SUM_KEY: &str = "SUM";

// ── CountMatrix ───────────────────────────────────────────────────────────────

/// Bucket key → age group → summed case count.
///
/// The [`SUM_KEY`] bucket is always present and accumulates every record
/// regardless of bucket mode. Key order is unspecified; renderers sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountMatrix {
    buckets: HashMap<String, HashMap<String, i64>>,
}

impl Default for CountMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl CountMatrix {
    /// An empty matrix containing only an empty [`SUM_KEY`] bucket.
    pub fn new() -> Self {
        let mut buckets = HashMap::new();
        buckets.insert(SUM_KEY.to_string(), HashMap::new());
        Self { buckets }
    }

    /// Add `count` to `bucket` (when given) and always to the grand total.
    pub fn add(&mut self, bucket: Option<&str>, age_group: &str, count: i64) {
        if let Some(key) = bucket {
            self.add_to(key, age_group, count);
        }
        self.add_to(SUM_KEY, age_group, count);
    }

    fn add_to(&mut self, bucket: &str, age_group: &str, count: i64) {
        let row = self.buckets.entry(bucket.to_string()).or_default();
        *row.entry(age_group.to_string()).or_insert(0) += count;
    }

    /// Count for one cell; absent cells read as zero.
    pub fn get(&self, bucket: &str, age_group: &str) -> i64 {
        self.buckets
            .get(bucket)
            .and_then(|row| row.get(age_group))
            .copied()
            .unwrap_or(0)
    }

    /// All age-group counts of one bucket.
    pub fn bucket(&self, key: &str) -> Option<&HashMap<String, i64>> {
        self.buckets.get(key)
    }

    /// The grand-total bucket.
    pub fn sums(&self) -> &HashMap<String, i64> {
        // `new` inserts SUM_KEY and nothing removes it.
        &self.buckets[SUM_KEY]
    }

    /// Bucket keys in unspecified order, including [`SUM_KEY`].
    pub fn bucket_keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Bucket keys sorted lexicographically, including [`SUM_KEY`].
    pub fn sorted_bucket_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.bucket_keys().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of buckets other than [`SUM_KEY`].
    pub fn period_count(&self) -> usize {
        self.buckets.len() - 1
    }

    /// Sum of the grand-total bucket over all age groups.
    pub fn grand_total(&self) -> i64 {
        self.sums().values().sum()
    }

    /// Fold `other` into `self` by key-wise summation.
    ///
    /// Associative and commutative, so partial matrices may be combined in
    /// any order.
    pub fn merge(&mut self, other: CountMatrix) {
        for (bucket, row) in other.buckets {
            let dest = self.buckets.entry(bucket).or_default();
            for (age_group, count) in row {
                *dest.entry(age_group).or_insert(0) += count;
            }
        }
    }
}

// ── AgeGroupHeader ────────────────────────────────────────────────────────────

/// Distinct age-group labels in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct AgeGroupHeader {
    labels: Vec<String>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl PartialEq for AgeGroupHeader {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for AgeGroupHeader {}

impl AgeGroupHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `label` unless it is already present. Returns `true` if added.
    pub fn insert(&mut self, label: &str) -> bool {
        if self.contains(label) {
            return false;
        }
        self.seen.insert(label.to_string());
        self.labels.push(label.to_string());
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.seen.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in first-seen order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Labels sorted lexicographically, as presented to the user.
    pub fn sorted(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.labels.iter().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    /// Set union with `other`; new labels keep `other`'s order after ours.
    pub fn merge(&mut self, other: &AgeGroupHeader) {
        for label in &other.labels {
            self.insert(label);
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for AgeGroupHeader {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut header = AgeGroupHeader::new();
        for label in iter {
            header.insert(label.as_ref());
        }
        header
    }
}
