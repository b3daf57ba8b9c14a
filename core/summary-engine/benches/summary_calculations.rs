//! FILENAME: core/summary-engine/benches/summary_calculations.rs
//! Benchmarks for the summary engine over synthetic surveys.
//!
//! Run with: cargo bench -p summary-engine --bench summary_calculations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use records::{MetadataTable, Record, RecordTable, SiteMetadata, Year};
use summary_engine::{aggregate, calculate_summary, GroupKeySet, SummaryDefinition};

// ============================================================================
// Helpers
// ============================================================================

const GROUPS: &[&str] = &["fish", "invertebrates", "macroalgae", "phytoplankton", "biota", "water"];
const SITES: usize = 200;
const NAMES_PER_GROUP: usize = 40;

/// Deterministic survey of `count` records spread over sites, groups and years.
fn synthetic_survey(count: usize) -> RecordTable {
    let records = (0..count)
        .map(|i| {
            let site = (i * 7919) % SITES + 1;
            let group = GROUPS[(i * 31) % GROUPS.len()];
            let year = Year::Known(1990 + ((i * 13) % 30) as i32);
            let name = format!("{}-{}", group, (i * 17) % NAMES_PER_GROUP);
            Record::new(site.to_string(), group, year).with_taxaname(name)
        })
        .collect();
    RecordTable::new(records)
}

fn synthetic_metadata() -> MetadataTable {
    let mut rows = Vec::with_capacity(SITES * GROUPS.len());
    for site in 1..=SITES {
        for group in GROUPS {
            rows.push(
                SiteMetadata::new(site.to_string(), *group)
                    .with_name(format!("Site {}", site))
                    .with_location(-10.0 - site as f64 * 0.01, 145.0)
                    .with_collection_period(1990, 2019),
            );
        }
    }
    MetadataTable::new(rows)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_aggregate(c: &mut Criterion) {
    let metadata = synthetic_metadata();
    let mut group = c.benchmark_group("aggregate");

    for size in [10_000usize, 100_000] {
        let records = synthetic_survey(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("taxagroup", size), &records, |b, records| {
            b.iter(|| aggregate(black_box(records), &GroupKeySet::taxagroup(), &metadata))
        });
        group.bench_with_input(
            BenchmarkId::new("taxagroup_taxaname", size),
            &records,
            |b, records| {
                b.iter(|| {
                    aggregate(black_box(records), &GroupKeySet::taxagroup_taxaname(), &metadata)
                })
            },
        );
    }

    group.finish();
}

fn bench_variants(c: &mut Criterion) {
    let metadata = synthetic_metadata();
    let records = synthetic_survey(50_000);
    let mut group = c.benchmark_group("variants");
    group.throughput(Throughput::Elements(records.len() as u64));

    let variants = [
        ("site_totals", SummaryDefinition::site_totals(GroupKeySet::taxagroup())),
        ("yearly_totals", SummaryDefinition::yearly_totals(GroupKeySet::taxagroup())),
        (
            "yearly_counts_filtered",
            SummaryDefinition::yearly_counts(GroupKeySet::taxagroup_taxaname())
                .with_taxagroup_filter(["fish", "macroalgae"]),
        ),
    ];

    for (name, definition) in &variants {
        group.bench_function(*name, |b| {
            b.iter(|| calculate_summary(black_box(&records), definition, &metadata))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_variants);
criterion_main!(benches);
