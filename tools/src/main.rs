//! attrition-report: headless runner for the attrition analytics engine.
//!
//! Usage:
//!   attrition-report --synthetic 5000 --seed 42 --segment contract
//!   attrition-report --records customers.json --config engine.json \
//!       --segment age --filter city=San\ Diego --range tenure=0..12 --json

use anyhow::{bail, Context, Result};
use attrition_core::{
    engine::{AttritionEngine, AttritionReport},
    filter::FilterCriteria,
    population::SyntheticPopulation,
    priority::PriorityTier,
    record::{validate_all, CategoricalField, CustomerRecord, NumericField},
    segment::{BinScheme, SegmentSpec},
    EngineConfig,
};
use chrono::{DateTime, Utc};
use std::env;

#[derive(serde::Serialize)]
struct ReportEnvelope<'a> {
    generated_at: DateTime<Utc>,
    source:       String,
    report:       &'a AttritionReport,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let synthetic = parse_arg(&args, "--synthetic", 0usize);
    let as_json = args.iter().any(|a| a == "--json");
    let records_path = flag_value(&args, "--records");
    let segment_name = flag_value(&args, "--segment").unwrap_or("contract");

    let config = match flag_value(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let (records, source) = match records_path {
        Some(path) => (load_records(path)?, path.to_string()),
        None if synthetic > 0 => (
            SyntheticPopulation::new(seed, synthetic).generate(),
            format!("synthetic n={synthetic} seed={seed}"),
        ),
        None => bail!("pass --records <file.json> or --synthetic <n>"),
    };

    let criteria = parse_criteria(&args)?;
    let spec = segment_spec(segment_name, &records)?;

    let engine = AttritionEngine::new(config)?;
    let report = engine.run(&records, &criteria, &spec)?;

    if as_json {
        let envelope = ReportEnvelope {
            generated_at: Utc::now(),
            source,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print_summary(&report, &source);
    }

    Ok(())
}

fn load_records(path: &str) -> Result<Vec<CustomerRecord>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading records {path}"))?;
    let records: Vec<CustomerRecord> =
        serde_json::from_str(&content).with_context(|| format!("parsing records {path}"))?;
    validate_all(&records)?;
    log::info!("loaded {} records from {path}", records.len());
    Ok(records)
}

fn segment_spec(name: &str, records: &[CustomerRecord]) -> Result<SegmentSpec> {
    let spec = match name {
        "age" => SegmentSpec::binned(NumericField::Age, BinScheme::age_brackets()),
        "tenure-years" => SegmentSpec::binned(NumericField::TenureMonths, BinScheme::tenure_years(6)?),
        "tenure-months" => SegmentSpec::distinct(NumericField::TenureMonths),
        "revenue-quartile" => SegmentSpec::binned(
            NumericField::TotalRevenue,
            BinScheme::quantiles(records, NumericField::TotalRevenue, 4)?,
        ),
        other => SegmentSpec::by(other.parse::<CategoricalField>()?),
    };
    Ok(spec)
}

/// `--filter field=a,b` (repeatable) and `--range field=lo..hi` (repeatable).
fn parse_criteria(args: &[String]) -> Result<FilterCriteria> {
    let mut criteria = FilterCriteria::new();

    for value in flag_values(args, "--filter") {
        let (field, selected) = value
            .split_once('=')
            .with_context(|| format!("--filter expects field=a,b, got '{value}'"))?;
        let field: CategoricalField = field.parse()?;
        criteria = criteria.select(field, selected.split(',').map(str::trim));
    }

    for value in flag_values(args, "--range") {
        let (field, bounds) = value
            .split_once('=')
            .with_context(|| format!("--range expects field=lo..hi, got '{value}'"))?;
        let (lo, hi) = bounds
            .split_once("..")
            .with_context(|| format!("--range bounds must be lo..hi, got '{bounds}'"))?;
        let field: NumericField = field.parse()?;
        let lo: f64 = lo.trim().parse().with_context(|| format!("bad lower bound '{lo}'"))?;
        let hi: f64 = hi.trim().parse().with_context(|| format!("bad upper bound '{hi}'"))?;
        criteria = criteria.range(field, lo, hi);
    }

    Ok(criteria)
}

fn print_summary(report: &AttritionReport, source: &str) {
    let h = &report.headline;
    println!("=== ATTRITION SUMMARY ===");
    println!("  source:          {source}");
    println!("  records:         {} of {}", report.filtered_records, report.input_records);
    println!("  installed base:  {}", h.installed_base);
    println!("  new customers:   {}", h.new_customers);
    println!("  churned:         {}", h.churned);
    println!("  net active:      {}", h.net_active);
    println!("  churn rate:      {:.1}%", h.churn_rate);
    println!("  nps:             {:.1} ({} respondents)", report.nps.nps_score, report.nps.respondents);
    println!(
        "  gini ({:?}):     {:.3}  top 20% hold {:.1}%",
        report.concentration.field,
        report.concentration.gini,
        report.concentration.top_share(0.2) * 100.0
    );

    println!();
    println!(
        "=== BUCKETS BY {} (n ≥ {}) ===",
        report.segmented_by.to_uppercase(),
        report.buckets.min_sample_size
    );
    for b in &report.buckets.buckets {
        let tier = report
            .priorities
            .tier_of(&b.label)
            .map_or("-".to_string(), |t| format!("{t:?}"));
        println!(
            "  {:<20} n={:<6} churned={:<5} rate={:>5.1}%  {}{}",
            b.label,
            b.total,
            b.churned,
            b.churn_rate,
            tier,
            if b.significant { "" } else { "  (insignificant)" }
        );
    }
    if report.unclassified > 0 {
        println!("  unclassified: {}", report.unclassified);
    }

    println!();
    println!("=== FINANCIAL IMPACT ===");
    let i = &report.impact;
    println!("  total loss:      {:.0}", i.total_loss);
    println!("  recoverable:     {:.0}", i.recoverable);
    match i.roi.value() {
        Some(roi) => println!("  roi:             {roi:.2}"),
        None => println!("  roi:             undefined (no campaign cost)"),
    }
    let counts = report.priorities.tier_counts();
    println!(
        "  tiers:           critical={} targeted={} watch={} ignore={}",
        counts[&PriorityTier::Critical],
        counts[&PriorityTier::Targeted],
        counts[&PriorityTier::Watch],
        counts[&PriorityTier::Ignore]
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn flag_values<'a>(args: &'a [String], flag: &'a str) -> impl Iterator<Item = &'a str> {
    args.windows(2)
        .filter(move |w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
