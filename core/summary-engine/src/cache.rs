//! FILENAME: core/summary-engine/src/cache.rs
//! Partition Cache - Interned representation of grouped record counts.
//!
//! The cache is designed for:
//! - A single O(n) pass over the record table
//! - Memory-efficient storage via value interning
//! - Cheap key comparisons once per-value sort ranks are built
//!
//! Architecture:
//! - Each unique value of a dimension is stored once and referenced by index
//! - A partition key is a small vector of value IDs, one per dimension
//! - Counts are accumulated per partition key in first-seen order

use std::cmp::Ordering;
use std::hash::Hash;

use records::{Record, SiteId, Year};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::{GroupField, SummaryDefinition};

// ============================================================================
// VALUE INTERNING
// ============================================================================

/// A reference to an interned value within a dimension's value store.
pub type ValueId = u32;

/// Unique values of one dimension, addressable by `ValueId`.
#[derive(Debug, Clone)]
pub struct ValueStore<T> {
    /// Map from value to its unique ID (for deduplication during build).
    value_to_id: FxHashMap<T, ValueId>,

    /// Unique values, indexed by ValueId.
    id_to_value: Vec<T>,

    /// Sort rank of each ValueId (ascending by value).
    ranks: Vec<u32>,

    /// Whether the ranks need rebuilding.
    rank_dirty: bool,
}

impl<T: Clone + Eq + Hash + Ord> ValueStore<T> {
    pub fn new() -> Self {
        ValueStore {
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
            ranks: Vec::new(),
            rank_dirty: false,
        }
    }

    /// Interns a value and returns its ValueId.
    /// If the value already exists, returns the existing ID.
    pub fn intern(&mut self, value: &T) -> ValueId {
        if let Some(&id) = self.value_to_id.get(value) {
            return id;
        }

        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value.clone(), id);
        self.rank_dirty = true;
        id
    }

    pub fn get(&self, id: ValueId) -> Option<&T> {
        self.id_to_value.get(id as usize)
    }

    /// Returns the number of unique values.
    pub fn unique_count(&self) -> usize {
        self.id_to_value.len()
    }

    /// Rebuilds the sort rank of every interned value.
    pub fn rebuild_ranks(&mut self) {
        if !self.rank_dirty {
            return;
        }
        let mut sorted: Vec<ValueId> = (0..self.id_to_value.len() as ValueId).collect();
        sorted.sort_by(|&a, &b| self.id_to_value[a as usize].cmp(&self.id_to_value[b as usize]));

        self.ranks = vec![0; sorted.len()];
        for (rank, id) in sorted.into_iter().enumerate() {
            self.ranks[id as usize] = rank as u32;
        }
        self.rank_dirty = false;
    }

    /// Sort rank of a value. Ranks must have been rebuilt since the last intern.
    pub fn rank(&self, id: ValueId) -> u32 {
        debug_assert!(!self.rank_dirty, "ranks are stale");
        self.ranks.get(id as usize).copied().unwrap_or(u32::MAX)
    }
}

impl<T: Clone + Eq + Hash + Ord> Default for ValueStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// DIMENSIONS & PARTITION KEY
// ============================================================================

/// One partitioning dimension of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    Year,
    Site,
    Group(GroupField),
}

/// A unique combination of dimension values, in `PartitionCache::dimensions` order.
pub type PartitionKey = SmallVec<[ValueId; 4]>;

// ============================================================================
// MAIN CACHE STRUCT
// ============================================================================

/// Statistics gathered while building a cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Records offered to the cache.
    pub total_records: usize,
    /// Records excluded by the taxa group filter.
    pub filtered_records: usize,
    /// Records without a value for one of the dimensions.
    pub skipped_records: usize,
    /// Distinct partitions.
    pub partition_count: usize,
}

/// Record counts per partition, built in one pass over the records.
#[derive(Debug, Clone)]
pub struct PartitionCache {
    dimensions: SmallVec<[Dimension; 4]>,
    years: ValueStore<Year>,
    sites: ValueStore<SiteId>,
    taxagroups: ValueStore<String>,
    taxanames: ValueStore<String>,
    /// Index into `partitions` for each key.
    index: FxHashMap<PartitionKey, usize>,
    /// Keys and counts in first-seen order.
    partitions: Vec<(PartitionKey, u64)>,
    pub stats: CacheStats,
}

impl PartitionCache {
    /// Creates an empty cache for the given dimensions.
    pub fn new(dimensions: &[Dimension]) -> Self {
        PartitionCache {
            dimensions: SmallVec::from_slice(dimensions),
            years: ValueStore::new(),
            sites: ValueStore::new(),
            taxagroups: ValueStore::new(),
            taxanames: ValueStore::new(),
            index: FxHashMap::default(),
            partitions: Vec::new(),
            stats: CacheStats::default(),
        }
    }

    /// Creates a cache partitioned the way a definition asks:
    /// year, then site, then the group keys in caller order.
    pub fn for_definition(definition: &SummaryDefinition) -> Self {
        let mut dimensions: Vec<Dimension> = Vec::with_capacity(definition.group_keys.len() + 2);
        if definition.by_year {
            dimensions.push(Dimension::Year);
        }
        if definition.by_site {
            dimensions.push(Dimension::Site);
        }
        dimensions.extend(definition.group_keys.iter().map(Dimension::Group));
        PartitionCache::new(&dimensions)
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Position of a dimension within partition keys.
    pub fn position(&self, dimension: Dimension) -> Option<usize> {
        self.dimensions.iter().position(|d| *d == dimension)
    }

    /// Counts a record into its partition.
    /// Returns false if the record lacks a value for some dimension.
    pub fn add_record(&mut self, record: &Record) -> bool {
        self.stats.total_records += 1;

        let mut key = PartitionKey::new();
        for dimension in self.dimensions.iter().copied() {
            let id = match dimension {
                Dimension::Year => self.years.intern(&record.year),
                Dimension::Site => self.sites.intern(&record.siteid),
                Dimension::Group(GroupField::TaxaGroup) => self.taxagroups.intern(&record.taxagroup),
                Dimension::Group(GroupField::TaxaName) => match &record.taxaname {
                    Some(name) => self.taxanames.intern(name),
                    None => {
                        self.stats.skipped_records += 1;
                        return false;
                    }
                },
            };
            key.push(id);
        }

        match self.index.get(&key) {
            Some(&slot) => self.partitions[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.partitions.len());
                self.partitions.push((key, 1));
            }
        }
        self.stats.partition_count = self.partitions.len();
        true
    }

    /// Notes a record excluded before counting.
    pub fn record_filtered(&mut self) {
        self.stats.total_records += 1;
        self.stats.filtered_records += 1;
    }

    /// Partitions and their counts in first-seen order.
    pub fn partitions(&self) -> &[(PartitionKey, u64)] {
        &self.partitions
    }

    /// Returns the record count of a partition.
    pub fn count(&self, key: &PartitionKey) -> u64 {
        self.index.get(key).map(|&slot| self.partitions[slot].1).unwrap_or(0)
    }

    /// Rebuilds sort ranks for every dimension store.
    pub fn rebuild_ranks(&mut self) {
        self.years.rebuild_ranks();
        self.sites.rebuild_ranks();
        self.taxagroups.rebuild_ranks();
        self.taxanames.rebuild_ranks();
    }

    fn rank_at(&self, key: &PartitionKey, position: usize) -> u32 {
        let id = key[position];
        match self.dimensions[position] {
            Dimension::Year => self.years.rank(id),
            Dimension::Site => self.sites.rank(id),
            Dimension::Group(GroupField::TaxaGroup) => self.taxagroups.rank(id),
            Dimension::Group(GroupField::TaxaName) => self.taxanames.rank(id),
        }
    }

    /// Compares two keys on the given key positions, in order, by value.
    pub fn compare_keys(&self, a: &PartitionKey, b: &PartitionKey, positions: &[usize]) -> Ordering {
        for &position in positions {
            let ordering = self.rank_at(a, position).cmp(&self.rank_at(b, position));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Whether two keys agree on all the given positions.
    pub fn same_on(a: &PartitionKey, b: &PartitionKey, positions: &[usize]) -> bool {
        positions.iter().all(|&p| a[p] == b[p])
    }

    pub fn year_of(&self, key: &PartitionKey) -> Option<Year> {
        let position = self.position(Dimension::Year)?;
        self.years.get(key[position]).copied()
    }

    pub fn site_of(&self, key: &PartitionKey) -> Option<&SiteId> {
        let position = self.position(Dimension::Site)?;
        self.sites.get(key[position])
    }

    pub fn group_value_of(&self, key: &PartitionKey, field: GroupField) -> Option<&str> {
        let position = self.position(Dimension::Group(field))?;
        let store = match field {
            GroupField::TaxaGroup => &self.taxagroups,
            GroupField::TaxaName => &self.taxanames,
        };
        store.get(key[position]).map(String::as_str)
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}
