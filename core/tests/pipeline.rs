//! End-to-end engine tests over generated and hand-built books.

use attrition_core::{
    config::{EngineConfig, FinancialConfig},
    engine::AttritionEngine,
    error::AnalyticsError,
    filter::FilterCriteria,
    population::SyntheticPopulation,
    record::{CategoricalField, CustomerRecord, CustomerStatus, NumericField},
    segment::{BinScheme, SegmentSpec},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn engine() -> AttritionEngine {
    AttritionEngine::new(EngineConfig::default()).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// A full run over a generated book keeps every cross-stage identity.
#[test]
fn full_run_is_internally_consistent() {
    let records = SyntheticPopulation::new(42, 2_000).generate();
    let report = engine()
        .run(&records, &FilterCriteria::new(), &SegmentSpec::by(CategoricalField::City))
        .unwrap();

    assert_eq!(report.input_records, 2_000);
    assert_eq!(report.filtered_records, 2_000);
    assert_eq!(report.segmented_by, "city");

    let head = &report.headline;
    assert_eq!(head.total_customers, report.filtered_records);
    assert_eq!(head.installed_base + head.new_customers, head.total_customers);
    assert_eq!(head.net_active + head.churned, head.total_customers);
    let shares: usize = report.status_breakdown.iter().map(|s| s.count).sum();
    assert_eq!(shares, head.total_customers);

    let bucket_total: usize = report.buckets.buckets.iter().map(|b| b.total).sum();
    assert_eq!(bucket_total + report.unclassified, report.filtered_records);

    let significant_churn: usize = report.buckets.significant().map(|b| b.churned).sum();
    assert_eq!(report.impact.churned, significant_churn);
    assert_eq!(report.impact.total_loss, significant_churn as f64 * 3_000.0);

    let impact_labels: Vec<&str> = report.bucket_impacts.iter().map(|b| b.label.as_str()).collect();
    let significant_labels: Vec<&str> = report.buckets.significant().map(|b| b.label.as_str()).collect();
    assert_eq!(impact_labels, significant_labels);

    assert_eq!(report.priorities.assignments.len(), report.buckets.significant_count());
    assert_eq!(
        report.priorities.excluded.len(),
        report.buckets.buckets.len() - report.buckets.significant_count()
    );

    let located: usize = report.geo.cities.iter().map(|c| c.total).sum();
    assert_eq!(located + report.geo.unlocated, report.filtered_records);
    assert!(report.geo.unlocated > 0, "about 5% of generated records lack coordinates");

    assert_eq!(report.concentration.population, report.filtered_records);
    assert!((0.0..=1.0).contains(&report.concentration.gini));
    assert!((-100.0..=100.0).contains(&report.nps.nps_score));
}

/// Filters run before everything else: every later stage sees the subset.
#[test]
fn filters_scope_every_stage() {
    let records = SyntheticPopulation::new(7, 1_500).generate();
    let criteria = FilterCriteria::new()
        .select(CategoricalField::ContractType, ["Month-to-Month"])
        .range(NumericField::Age, 30.0, 60.0);
    let report = engine()
        .run(
            &records,
            &criteria,
            &SegmentSpec::binned(NumericField::TenureMonths, BinScheme::tenure_years(6).unwrap()),
        )
        .unwrap();

    let expected = records
        .iter()
        .filter(|r| r.contract_type == "Month-to-Month" && (30..=60).contains(&r.age))
        .count();
    assert_eq!(report.filtered_records, expected);
    assert_eq!(report.headline.total_customers, expected);
    assert_eq!(report.concentration.population, expected);
    assert_eq!(report.buckets.buckets.len(), 6, "empty tenure years are still listed");
}

/// Small buckets are flagged and kept out of tiers and per-bucket impact.
#[test]
fn small_buckets_stay_out_of_decisions() {
    let mut records: Vec<CustomerRecord> = (0..60)
        .map(|i| {
            CustomerRecord::new(format!("big-{i}"), CustomerStatus::Churned)
                .with_city("Fresno")
                .with_churn_details("Price", "Price too high")
        })
        .collect();
    records.extend((0..10).map(|i| {
        CustomerRecord::new(format!("small-{i}"), CustomerStatus::Churned)
            .with_city("Oakland")
            .with_churn_details("Price", "Price too high")
    }));

    let report = engine()
        .run(&records, &FilterCriteria::new(), &SegmentSpec::by(CategoricalField::City))
        .unwrap();

    assert_eq!(report.buckets.buckets.len(), 2);
    assert_eq!(report.bucket_impacts.len(), 1);
    assert_eq!(report.bucket_impacts[0].label, "Fresno");
    assert_eq!(report.impact.churned, 60);
    assert_eq!(report.priorities.tier_of("Oakland"), None);
    assert!(report.priorities.tier_of("Fresno").is_some());
    // The headline is not gated: all 70 churned customers count.
    assert_eq!(report.headline.churned, 70);
}

/// An empty selection degrades to zeros instead of failing.
#[test]
fn empty_selection_reports_zeros() {
    let records = SyntheticPopulation::new(5, 300).generate();
    let criteria = FilterCriteria::new().select(CategoricalField::City, ["Atlantis"]);
    let report = engine()
        .run(&records, &criteria, &SegmentSpec::by(CategoricalField::Offer))
        .unwrap();

    assert_eq!(report.filtered_records, 0);
    assert_eq!(report.headline.churn_rate, 0.0);
    assert!(report.buckets.buckets.is_empty());
    assert_eq!(report.impact.total_loss, 0.0);
    assert_eq!(report.concentration.gini, 0.0);
    assert_eq!(report.nps.respondents, 0);
    assert!(report.geo.cities.is_empty());
}

/// Structural errors fail the call.
#[test]
fn structural_errors_fail_the_run() {
    let records = SyntheticPopulation::new(1, 50).generate();
    let bad_range = FilterCriteria::new().range(NumericField::TenureMonths, 24.0, 12.0);
    let err = engine()
        .run(&records, &bad_range, &SegmentSpec::by(CategoricalField::City))
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidFilter { .. }), "got {err:?}");

    let config = EngineConfig {
        financial: FinancialConfig {
            retention_recovery_rate: 1.5,
            ..FinancialConfig::default()
        },
        ..EngineConfig::default()
    };
    assert!(matches!(
        AttritionEngine::new(config),
        Err(AnalyticsError::InvalidConfig { .. })
    ));
}

/// Config sections override the defaults used by the stages.
#[test]
fn config_drives_the_stages() {
    let config = EngineConfig::from_json(
        r#"{
            "significance": { "min_sample_size": 1 },
            "financial": { "unit_cltv": 10.0, "retention_recovery_rate": 0.5, "campaign_cost": 5.0 }
        }"#,
    )
    .unwrap();
    let engine = AttritionEngine::new(config).unwrap();

    let records = vec![
        CustomerRecord::new("a", CustomerStatus::Churned)
            .with_city("Fresno")
            .with_churn_details("Other", "Moved"),
        CustomerRecord::new("b", CustomerStatus::Active).with_city("Fresno"),
    ];
    let report = engine
        .run(&records, &FilterCriteria::new(), &SegmentSpec::by(CategoricalField::City))
        .unwrap();

    assert_eq!(report.buckets.significant_count(), 1);
    assert_eq!(report.impact.total_loss, 10.0);
    assert_eq!(report.impact.recoverable, 5.0);
    assert_eq!(report.impact.roi.value(), Some(1.0));
}
