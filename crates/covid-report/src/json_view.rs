//! JSON rendering of an aggregation result with sorted keys.

use std::collections::BTreeMap;

use covid_core::error::Result;
use covid_core::matrix::{AgeGroupHeader, CountMatrix};
use covid_core::models::BucketMode;
use serde::Serialize;

/// Serialisable snapshot of one report.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub bucket_mode: BucketMode,
    pub age_groups: Vec<&'a str>,
    pub buckets: BTreeMap<&'a str, BTreeMap<&'a str, i64>>,
}

impl<'a> JsonReport<'a> {
    pub fn new(
        matrix: &'a CountMatrix,
        header: &'a AgeGroupHeader,
        bucket_mode: BucketMode,
    ) -> Self {
        let buckets = matrix
            .bucket_keys()
            .filter_map(|key| {
                let row = matrix.bucket(key)?;
                let counts = row.iter().map(|(age, n)| (age.as_str(), *n)).collect();
                Some((key, counts))
            })
            .collect();
        Self {
            bucket_mode,
            age_groups: header.sorted(),
            buckets,
        }
    }
}

/// Pretty-printed JSON for `matrix` and `header`.
pub fn render_json(
    matrix: &CountMatrix,
    header: &AgeGroupHeader,
    bucket_mode: BucketMode,
) -> Result<String> {
    let report = JsonReport::new(matrix, header, bucket_mode);
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_json_sorted() {
        let mut matrix = CountMatrix::new();
        matrix.add(Some("2021-02"), "A05-A14", 10);
        matrix.add(Some("2021-01"), "A00-A04", 30);
        let header: AgeGroupHeader = ["A05-A14", "A00-A04"].into_iter().collect();

        let json = render_json(&matrix, &header, BucketMode::Month).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["bucket_mode"], "month");
        assert_eq!(value["age_groups"], serde_json::json!(["A00-A04", "A05-A14"]));
        assert_eq!(value["buckets"]["2021-01"]["A00-A04"], 30);
        assert_eq!(value["buckets"]["SUM"]["A05-A14"], 10);

        let keys: Vec<&String> = value["buckets"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["2021-01", "2021-02", "SUM"]);
    }

    #[test]
    fn test_render_json_empty() {
        let json =
            render_json(&CountMatrix::new(), &AgeGroupHeader::new(), BucketMode::None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["age_groups"], serde_json::json!([]));
        assert_eq!(value["buckets"], serde_json::json!({ "SUM": {} }));
    }
}
