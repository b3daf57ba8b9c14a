//! FILENAME: core/summary-engine/src/engine.rs
//! Summary Engine - The calculation core that turns records into summaries.
//!
//! This module takes a RecordTable (data), a SummaryDefinition
//! (configuration) and a MetadataTable (enrichment) and produces a
//! SummaryTable.
//!
//! Algorithm:
//! 1. Partition records and count each partition exactly
//! 2. Sort partitions by (group keys, site, year)
//! 3. Running totals of the counts within each (group keys, site) partition
//! 4. Left-join site metadata on (siteid, taxagroup)
//! 5. Fill missing collection years with 0 (after the join)
//! 6. Derive age = endyearcollected - startyearcollected
//! 7. Stable sort by value, descending
//! 8. Project the output columns

use records::{MetadataTable, RecordTable, SiteId, SiteMetadata};
use rustc_hash::FxHashMap;

use crate::cache::{Dimension, PartitionCache, PartitionKey};
use crate::definition::{GroupField, GroupKeySet, SummaryDefinition, SummaryOrder};
use crate::error::SummaryError;
use crate::view::{SummaryRow, SummaryTable};

// ============================================================================
// METADATA INDEX
// ============================================================================

/// Lookup of metadata rows by (taxagroup, siteid).
/// When the sheet repeats a key, the first row wins.
pub struct MetadataIndex<'a> {
    by_group: FxHashMap<&'a str, FxHashMap<&'a SiteId, &'a SiteMetadata>>,
    duplicates: usize,
}

impl<'a> MetadataIndex<'a> {
    pub fn build(metadata: &'a MetadataTable) -> Self {
        let mut by_group: FxHashMap<&'a str, FxHashMap<&'a SiteId, &'a SiteMetadata>> =
            FxHashMap::default();
        let mut duplicates = 0;

        for row in metadata.iter() {
            let sites = by_group.entry(row.taxagroup.as_str()).or_default();
            if sites.contains_key(&row.siteid) {
                duplicates += 1;
                log::warn!(
                    "duplicate metadata for site={} taxagroup={}; keeping the first row",
                    row.siteid,
                    row.taxagroup
                );
                continue;
            }
            sites.insert(&row.siteid, row);
        }

        MetadataIndex { by_group, duplicates }
    }

    pub fn get(&self, siteid: &SiteId, taxagroup: &str) -> Option<&'a SiteMetadata> {
        self.by_group
            .get(taxagroup)
            .and_then(|sites| sites.get(siteid))
            .copied()
    }

    /// Number of metadata rows ignored because their key was already taken.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }
}

// ============================================================================
// SUMMARY CALCULATOR
// ============================================================================

/// The main calculation engine for summary tables.
pub struct SummaryCalculator<'a> {
    definition: &'a SummaryDefinition,
    records: &'a RecordTable,
    metadata: &'a MetadataTable,
    cache: PartitionCache,
}

impl<'a> SummaryCalculator<'a> {
    /// Creates a new calculator after validating the definition.
    pub fn new(
        definition: &'a SummaryDefinition,
        records: &'a RecordTable,
        metadata: &'a MetadataTable,
    ) -> Result<Self, SummaryError> {
        definition.validate(records.schema())?;
        Ok(SummaryCalculator {
            definition,
            records,
            metadata,
            cache: PartitionCache::for_definition(definition),
        })
    }

    /// Executes the full calculation and returns the table.
    pub fn calculate(mut self) -> SummaryTable {
        // Step 1: Partition & count
        self.count_partitions();

        // Step 2-3: Order partitions and accumulate running totals
        self.cache.rebuild_ranks();
        let mut keys: Vec<PartitionKey> =
            self.cache.partitions().iter().map(|(k, _)| k.clone()).collect();
        let cumulative = if self.definition.cumulative {
            self.sort_keys(&mut keys, &self.cumulative_order());
            Some(self.running_totals(&keys))
        } else {
            self.sort_keys(&mut keys, &self.grouping_order());
            None
        };

        let mut rows: Vec<SummaryRow> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let mut row = self.materialize(key);
                row.cumulative_value = cumulative.as_ref().map(|totals| totals[i]);
                row
            })
            .collect();

        // Step 4-6: Enrich with site metadata
        if self.definition.enrich {
            self.enrich(&mut rows);
        }

        // Step 7: Final ordering
        match self.definition.order {
            SummaryOrder::ValueDescending => rows.sort_by(|a, b| b.value.cmp(&a.value)),
            SummaryOrder::Grouping => {
                if self.definition.cumulative {
                    let order = self.grouping_order();
                    let mut indexed: Vec<(PartitionKey, SummaryRow)> =
                        keys.into_iter().zip(rows).collect();
                    indexed.sort_by(|(a, _), (b, _)| self.cache.compare_keys(a, b, &order));
                    rows = indexed.into_iter().map(|(_, row)| row).collect();
                }
            }
        }

        log::debug!(
            "summary keys={:?} records={} filtered={} skipped={} rows={}",
            self.definition.group_keys.fields(),
            self.cache.stats.total_records,
            self.cache.stats.filtered_records,
            self.cache.stats.skipped_records,
            rows.len()
        );

        // Step 8: Column projection
        SummaryTable {
            columns: self.definition.projection(),
            rows,
            stats: self.cache.stats.clone(),
        }
    }

    /// Counts every record that passes the taxa group filter.
    fn count_partitions(&mut self) {
        let filter = self.definition.taxagroup_filter.as_ref();
        for record in self.records.iter() {
            if let Some(allowed) = filter {
                if !allowed.contains(&record.taxagroup) {
                    self.cache.record_filtered();
                    continue;
                }
            }
            self.cache.add_record(record);
        }
    }

    /// Key positions for the pre-cumsum sort: group keys, site, year.
    fn cumulative_order(&self) -> Vec<usize> {
        let mut order = self.group_positions();
        order.extend(self.cache.position(Dimension::Site));
        order.extend(self.cache.position(Dimension::Year));
        order
    }

    /// Key positions for the grouping sort: year, group keys, site.
    fn grouping_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = self.cache.position(Dimension::Year).into_iter().collect();
        order.extend(self.group_positions());
        order.extend(self.cache.position(Dimension::Site));
        order
    }

    fn group_positions(&self) -> Vec<usize> {
        self.definition
            .group_keys
            .iter()
            .filter_map(|f| self.cache.position(Dimension::Group(f)))
            .collect()
    }

    fn sort_keys(&self, keys: &mut [PartitionKey], order: &[usize]) {
        keys.sort_by(|a, b| self.cache.compare_keys(a, b, order));
    }

    /// Prefix sums of counts; `keys` must already be in cumulative order.
    /// The sum restarts whenever the (group keys, site) partition changes.
    fn running_totals(&self, keys: &[PartitionKey]) -> Vec<u64> {
        let mut partition = self.group_positions();
        partition.extend(self.cache.position(Dimension::Site));

        let mut totals = Vec::with_capacity(keys.len());
        let mut running = 0u64;
        for (i, key) in keys.iter().enumerate() {
            if i > 0 && !PartitionCache::same_on(&keys[i - 1], key, &partition) {
                running = 0;
            }
            running += self.cache.count(key);
            totals.push(running);
        }
        totals
    }

    /// Resolves a partition key back into a typed row.
    fn materialize(&self, key: &PartitionKey) -> SummaryRow {
        let mut row = SummaryRow::counted(self.cache.count(key));
        row.year = self.cache.year_of(key);
        row.siteid = self.cache.site_of(key).cloned();
        row.taxagroup = self
            .cache
            .group_value_of(key, GroupField::TaxaGroup)
            .map(str::to_string);
        row.taxaname = self
            .cache
            .group_value_of(key, GroupField::TaxaName)
            .map(str::to_string);
        row
    }

    /// Left outer join on (siteid, taxagroup), then fill and derive age.
    fn enrich(&self, rows: &mut [SummaryRow]) {
        let index = if self.definition.joins_metadata() {
            Some(MetadataIndex::build(self.metadata))
        } else {
            log::debug!("group keys exclude taxagroup; skipping metadata join");
            None
        };

        let mut unmatched = 0usize;
        for row in rows.iter_mut() {
            let matched = match (&index, &row.siteid, &row.taxagroup) {
                (Some(index), Some(siteid), Some(taxagroup)) => index.get(siteid, taxagroup),
                _ => None,
            };

            match matched {
                Some(meta) => {
                    row.sitename = meta.sitename.clone();
                    row.decimallatitude = meta.decimallatitude;
                    row.decimallongitude = meta.decimallongitude;
                    row.startyearcollected = meta.startyearcollected;
                    row.endyearcollected = meta.endyearcollected;
                }
                None => unmatched += 1,
            }

            // Fill policy: strictly after the join.
            let start = *row.startyearcollected.get_or_insert(0);
            let end = *row.endyearcollected.get_or_insert(0);
            row.age = Some(end - start);
        }

        if unmatched > 0 {
            log::debug!("{} of {} rows have no site metadata", unmatched, rows.len());
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Calculates a summary table from records, a definition and site metadata.
/// This is the main entry point for the calculation engine.
pub fn calculate_summary(
    records: &RecordTable,
    definition: &SummaryDefinition,
    metadata: &MetadataTable,
) -> Result<SummaryTable, SummaryError> {
    let calculator = SummaryCalculator::new(definition, records, metadata)?;
    Ok(calculator.calculate())
}

/// Per (year, site, group keys) counts with running totals over increasing
/// year, enriched with site metadata and sorted by count, largest first.
pub fn aggregate(
    records: &RecordTable,
    group_keys: &GroupKeySet,
    metadata: &MetadataTable,
) -> Result<SummaryTable, SummaryError> {
    let definition = SummaryDefinition::site_timeline(group_keys.clone());
    calculate_summary(records, &definition, metadata)
}
