use std::collections::{BTreeSet, HashMap};

use covid_core::matrix::{CountMatrix, SUM_KEY};
use covid_core::models::{BucketMode, Filter, Record};
use covid_data::aggregator::aggregate;
use proptest::prelude::*;

const REGIONS: [&str; 3] = ["08221", "08222", "09162"];
const AGE_GROUPS: [&str; 5] = ["A00-A04", "A05-A14", "A35-A59", "A80+", "unbekannt"];

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        prop::sample::select(REGIONS.to_vec()),
        prop::sample::select(AGE_GROUPS.to_vec()),
        2020u32..=2022,
        1u32..=12,
        1u32..=28,
        0i64..1_000,
    )
        .prop_map(|(region, age, year, month, day, count)| Record {
            region_code: region.to_string(),
            age_group: age.to_string(),
            date: format!("{year}-{month:02}-{day:02}"),
            case_count: count,
            death_count: Some(0),
        })
}

fn filter_strategy() -> impl Strategy<Value = Filter> {
    (
        prop::option::of(prop::sample::select(REGIONS.to_vec())),
        prop::option::of(prop::sample::select(AGE_GROUPS.to_vec())),
        prop::option::of(prop::sample::select(vec!["2020", "2021", "2022"])),
    )
        .prop_map(|(region, age, year)| {
            Filter::new(
                region.map(str::to_string),
                age.map(str::to_string),
                year.map(str::to_string),
            )
        })
}

fn mode_strategy() -> impl Strategy<Value = BucketMode> {
    prop::sample::select(vec![BucketMode::None, BucketMode::Month, BucketMode::Year])
}

fn run(records: &[Record], filter: &Filter, mode: BucketMode) -> CountMatrix {
    let (matrix, _) = aggregate(records.iter().cloned().map(Ok), filter, mode).unwrap();
    matrix
}

proptest! {
    #[test]
    fn sum_bucket_equals_filtered_total(
        records in prop::collection::vec(record_strategy(), 0..200),
        filter in filter_strategy(),
        mode in mode_strategy(),
    ) {
        let matrix = run(&records, &filter, mode);
        let expected: i64 = records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.case_count)
            .sum();
        prop_assert_eq!(matrix.grand_total(), expected);
    }

    #[test]
    fn buckets_partition_the_sum(
        records in prop::collection::vec(record_strategy(), 0..200),
        filter in filter_strategy(),
        mode in prop::sample::select(vec![BucketMode::Month, BucketMode::Year]),
    ) {
        let matrix = run(&records, &filter, mode);
        let mut per_age: HashMap<&str, i64> = HashMap::new();
        for key in matrix.bucket_keys().filter(|k| *k != SUM_KEY) {
            for (age, count) in matrix.bucket(key).unwrap() {
                *per_age.entry(age.as_str()).or_insert(0) += count;
            }
        }
        for (age, total) in matrix.sums() {
            prop_assert_eq!(per_age.get(age.as_str()).copied().unwrap_or(0), *total);
        }
    }

    #[test]
    fn tightening_a_filter_never_increases_counts(
        records in prop::collection::vec(record_strategy(), 0..200),
        region in prop::sample::select(REGIONS.to_vec()),
        mode in mode_strategy(),
    ) {
        let loose = run(&records, &Filter::default(), mode);
        let tight = run(&records, &Filter::default().with_region(region), mode);
        for key in tight.bucket_keys() {
            for (age, count) in tight.bucket(key).unwrap() {
                prop_assert!(*count <= loose.get(key, age));
            }
        }
    }

    #[test]
    fn header_is_exactly_the_filtered_labels(
        records in prop::collection::vec(record_strategy(), 0..200),
        filter in filter_strategy(),
        mode in mode_strategy(),
    ) {
        let (_, header) =
            aggregate(records.iter().cloned().map(Ok), &filter, mode).unwrap();
        let expected: BTreeSet<&str> = records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.age_group.as_str())
            .collect();
        let actual: BTreeSet<&str> = header.labels().iter().map(String::as_str).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(header.len(), header.labels().len());
    }

    #[test]
    fn aggregation_is_idempotent(
        records in prop::collection::vec(record_strategy(), 0..100),
        filter in filter_strategy(),
        mode in mode_strategy(),
    ) {
        prop_assert_eq!(run(&records, &filter, mode), run(&records, &filter, mode));
    }
}
