//! Segmenter tests: complete partition, bin edges, presets and bucket order.

use attrition_core::{
    aggregate::{aggregate, aggregate_all},
    error::AnalyticsError,
    population::SyntheticPopulation,
    record::{CategoricalField, CustomerRecord, CustomerStatus, NumericField},
    segment::{segment, BinScheme, Closed, SegmentSpec},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn specs(records: &[CustomerRecord]) -> Vec<SegmentSpec> {
    vec![
        SegmentSpec::by(CategoricalField::City),
        SegmentSpec::by(CategoricalField::ContractType),
        SegmentSpec::by(CategoricalField::ChurnCategory),
        SegmentSpec::binned(NumericField::Age, BinScheme::age_brackets()),
        SegmentSpec::binned(NumericField::TenureMonths, BinScheme::tenure_years(4).unwrap()),
        SegmentSpec::binned(
            NumericField::TotalRevenue,
            BinScheme::quantiles(records, NumericField::TotalRevenue, 4).unwrap(),
        ),
        SegmentSpec::distinct(NumericField::TenureMonths),
        SegmentSpec::binned(
            NumericField::SatisfactionScore,
            BinScheme::new(vec![1.0, 3.0, 5.0], vec!["low", "high"]).unwrap(),
        ),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Σ bucket.total + unclassified == len(records) for every spec and seed.
#[test]
fn segmentation_is_a_complete_partition() {
    for seed in [1u64, 7, 42, 1234, 0xBEEF] {
        let records = SyntheticPopulation::new(seed, 400).generate();
        for spec in specs(&records) {
            let seg = segment(&records, &spec).unwrap();
            let summaries = aggregate_all(&seg, 1);
            let bucket_total: usize = summaries.iter().map(|b| b.total).sum();
            assert_eq!(
                bucket_total + seg.unclassified,
                records.len(),
                "seed {seed}: partition by {} lost or duplicated records",
                spec.name()
            );
        }
    }
}

/// Missing values go to the unclassified count, not to a bucket.
#[test]
fn missing_values_are_counted_as_unclassified() {
    let records = vec![
        CustomerRecord::new("a", CustomerStatus::Churned).with_churn_details("Price", "Too high"),
        CustomerRecord::new("b", CustomerStatus::Active),
        CustomerRecord::new("c", CustomerStatus::Active).with_city(""),
    ];

    let by_category = segment(&records, &SegmentSpec::by(CategoricalField::ChurnCategory)).unwrap();
    assert_eq!(by_category.buckets.len(), 1);
    assert_eq!(by_category.buckets[0].label, "Price");
    assert_eq!(by_category.unclassified, 2);

    let by_city = segment(&records, &SegmentSpec::by(CategoricalField::City)).unwrap();
    assert!(by_city.buckets.is_empty());
    assert_eq!(by_city.unclassified, 3);
}

/// Values outside every bin are unclassified too.
#[test]
fn out_of_range_values_are_unclassified() {
    let records = vec![
        CustomerRecord::new("a", CustomerStatus::Active).with_age(17),
        CustomerRecord::new("b", CustomerStatus::Active).with_age(30),
        CustomerRecord::new("c", CustomerStatus::Active).with_age(101),
    ];
    let bins = BinScheme::new(vec![18.0, 65.0, 100.0], vec!["adult", "senior"]).unwrap();
    let seg = segment(&records, &SegmentSpec::binned(NumericField::Age, bins)).unwrap();
    assert_eq!(seg.classified(), 1);
    assert_eq!(seg.unclassified, 2);
}

/// Non-increasing edges fail with InvalidBinSpec, whether built or deserialized.
#[test]
fn non_monotonic_edges_are_rejected() {
    let built = BinScheme::new(vec![0.0, 10.0, 10.0], vec!["a", "b"]);
    assert!(matches!(built, Err(AnalyticsError::InvalidBinSpec { .. })));

    let spec: SegmentSpec = serde_json::from_str(
        r#"{ "kind": "binned", "field": "age", "bins": { "edges": [0.0, 50.0, 20.0], "labels": ["x", "y"] } }"#,
    )
    .unwrap();
    let err = segment(&[], &spec).unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidBinSpec { .. }), "got {err:?}");
}

/// Binned buckets keep scheme order and keep empty bins, which report 0%.
#[test]
fn empty_bins_are_kept_and_render_zero() {
    let records = vec![CustomerRecord::new("a", CustomerStatus::Churned)
        .with_age(20)
        .with_churn_details("Other", "Moved")];
    let seg = segment(
        &records,
        &SegmentSpec::binned(NumericField::Age, BinScheme::age_brackets()),
    )
    .unwrap();

    let labels: Vec<&str> = seg.buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, BinScheme::age_brackets().labels());

    let first = aggregate(&seg.buckets[0], 1);
    assert_eq!(first.churn_rate, 100.0);
    for bucket in &seg.buckets[1..] {
        let s = aggregate(bucket, 1);
        assert_eq!(s.total, 0);
        assert_eq!(s.churn_rate, 0.0);
    }
}

/// Categorical buckets come out sorted by label.
#[test]
fn categorical_buckets_are_sorted() {
    let records = vec![
        CustomerRecord::new("a", CustomerStatus::Active).with_city("Oakland"),
        CustomerRecord::new("b", CustomerStatus::Active).with_city("Fresno"),
        CustomerRecord::new("c", CustomerStatus::Active).with_city("Oakland"),
    ];
    let seg = segment(&records, &SegmentSpec::by(CategoricalField::City)).unwrap();
    let labels: Vec<&str> = seg.buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["Fresno", "Oakland"]);
    assert_eq!(seg.buckets[1].len(), 2);
}

/// Distinct buckets order numerically, not lexically (2 before 10).
#[test]
fn distinct_buckets_order_numerically() {
    let records = vec![
        CustomerRecord::new("a", CustomerStatus::Active).with_tenure(10),
        CustomerRecord::new("b", CustomerStatus::Active).with_tenure(2),
        CustomerRecord::new("c", CustomerStatus::Active).with_tenure(10),
    ];
    let seg = segment(&records, &SegmentSpec::distinct(NumericField::TenureMonths)).unwrap();
    let labels: Vec<&str> = seg.buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["2", "10"]);
}

/// Aggregating the same bucket twice yields identical summaries.
#[test]
fn aggregation_is_deterministic() {
    let records = SyntheticPopulation::new(5, 300).generate();
    let seg = segment(&records, &SegmentSpec::by(CategoricalField::ContractType)).unwrap();
    for bucket in &seg.buckets {
        assert_eq!(aggregate(bucket, 2), aggregate(bucket, 2));
    }
}

/// A bucket's metrics match a direct recount of its members.
#[test]
fn bucket_metrics_match_member_recount() {
    let records = SyntheticPopulation::new(11, 500).generate();
    let seg = segment(&records, &SegmentSpec::by(CategoricalField::Offer)).unwrap();
    for bucket in &seg.buckets {
        let s = aggregate(bucket, 1);
        let churned = bucket.members.iter().filter(|r| r.is_churned()).count();
        let revenue: f64 = bucket.members.iter().map(|r| r.total_revenue).sum();
        assert_eq!(s.total, bucket.len());
        assert_eq!(s.churned, churned);
        assert!((s.revenue_sum - revenue).abs() < 1e-6);
        if let Some(avg) = s.avg_satisfaction {
            assert!((1.0..=5.0).contains(&avg), "avg satisfaction {avg} outside 1-5");
        }
    }
}

/// Quantile bins split a spread of values into roughly even groups.
#[test]
fn quantile_bins_are_roughly_even() {
    let records: Vec<CustomerRecord> = (0..100)
        .map(|i| CustomerRecord::new(format!("c-{i}"), CustomerStatus::Active).with_revenue(i as f64))
        .collect();
    let bins = BinScheme::quantiles(&records, NumericField::TotalRevenue, 4).unwrap();
    assert_eq!(bins.labels().len(), 4);
    let seg = segment(&records, &SegmentSpec::binned(NumericField::TotalRevenue, bins)).unwrap();
    assert_eq!(seg.unclassified, 0);
    for bucket in &seg.buckets {
        assert!(
            (20..=30).contains(&bucket.len()),
            "quartile {} has {} members",
            bucket.label,
            bucket.len()
        );
    }
}

/// With no spread at all, quantiles degrade to a single bucket.
#[test]
fn quantiles_over_identical_values_use_one_bucket() {
    let records: Vec<CustomerRecord> = (0..10)
        .map(|i| CustomerRecord::new(format!("c-{i}"), CustomerStatus::Active).with_revenue(50.0))
        .collect();
    let bins = BinScheme::quantiles(&records, NumericField::TotalRevenue, 4).unwrap();
    let seg = segment(&records, &SegmentSpec::binned(NumericField::TotalRevenue, bins)).unwrap();
    assert_eq!(seg.buckets.len(), 1);
    assert_eq!(seg.buckets[0].len(), 10);
}

/// Age brackets hold their upper edge: 25 is "18-25", 32 is "25-32", 74 is "67-74".
#[test]
fn age_bracket_edges_belong_to_the_lower_bracket() {
    let bins = BinScheme::age_brackets();
    assert_eq!(bins.label_for(25.0), Some("18-25"));
    assert_eq!(bins.label_for(32.0), Some("25-32"));
    assert_eq!(bins.label_for(74.0), Some("67-74"));
    assert_eq!(bins.label_for(0.0), None, "the lowest edge is outside every bracket");

    let records: Vec<CustomerRecord> = [25u32, 32, 39]
        .iter()
        .map(|age| CustomerRecord::new(format!("a{age}"), CustomerStatus::Active).with_age(*age))
        .collect();
    let seg = segment(&records, &SegmentSpec::binned(NumericField::Age, bins)).unwrap();
    let counts: Vec<(&str, usize)> = seg
        .buckets
        .iter()
        .take(3)
        .map(|b| (b.label.as_str(), b.len()))
        .collect();
    assert_eq!(counts, vec![("18-25", 1), ("25-32", 1), ("32-39", 1)]);
    assert_eq!(seg.unclassified, 0);
}

/// Schemes read from JSON without a closed side default to left-closed.
#[test]
fn closed_side_defaults_to_left() {
    let bins: BinScheme =
        serde_json::from_str(r#"{ "edges": [0.0, 10.0, 20.0], "labels": ["lo", "hi"] }"#).unwrap();
    assert_eq!(bins.closed_side(), Closed::Left);
    assert_eq!(bins.label_for(10.0), Some("hi"));

    let right: BinScheme = serde_json::from_str(
        r#"{ "edges": [0.0, 10.0, 20.0], "labels": ["lo", "hi"], "closed": "right" }"#,
    )
    .unwrap();
    assert_eq!(right.label_for(10.0), Some("lo"));
}

/// Identical values beyond 2^53 still yield a valid single quantile bucket.
#[test]
fn quantiles_over_huge_identical_values_stay_valid() {
    let records: Vec<CustomerRecord> = (0..5)
        .map(|i| CustomerRecord::new(format!("h-{i}"), CustomerStatus::Active).with_revenue(1e17))
        .collect();
    let bins = BinScheme::quantiles(&records, NumericField::TotalRevenue, 4).unwrap();
    let seg = segment(&records, &SegmentSpec::binned(NumericField::TotalRevenue, bins)).unwrap();
    assert_eq!(seg.buckets.len(), 1);
    assert_eq!(seg.buckets[0].len(), 5);
}
