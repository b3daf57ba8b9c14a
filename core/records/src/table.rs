//! FILENAME: core/records/src/table.rs
//! PURPOSE: The immutable input table of normalized survey records.
//! CONTEXT: Raw survey files are concatenated into one `RecordTable`. The
//! table remembers which optional columns its sources supplied, so that
//! aggregations can reject group keys the data never carried.

use serde::{Deserialize, Serialize};

use crate::record::{Attribute, Record};

/// Which attributes the record sources supplied as columns.
/// `siteid`, `taxagroup` and `year` are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub has_taxaname: bool,
}

impl RecordSchema {
    pub fn contains(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::TaxaName => self.has_taxaname,
            Attribute::SiteId | Attribute::TaxaGroup | Attribute::Year => true,
        }
    }

    /// Schema of a table built from several sources.
    pub fn union(self, other: RecordSchema) -> RecordSchema {
        RecordSchema {
            has_taxaname: self.has_taxaname || other.has_taxaname,
        }
    }
}

impl Default for RecordSchema {
    fn default() -> Self {
        RecordSchema { has_taxaname: true }
    }
}

/// An ordered, read-only collection of records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordTable {
    records: Vec<Record>,
    schema: RecordSchema,
}

impl RecordTable {
    /// Creates a table with the full record schema.
    pub fn new(records: Vec<Record>) -> Self {
        RecordTable {
            records,
            schema: RecordSchema::default(),
        }
    }

    pub fn with_schema(records: Vec<Record>, schema: RecordSchema) -> Self {
        RecordTable { records, schema }
    }

    /// Concatenates tables in order, merging their schemas.
    pub fn concat(tables: impl IntoIterator<Item = RecordTable>) -> Self {
        let mut records = Vec::new();
        let mut schema: Option<RecordSchema> = None;
        for table in tables {
            schema = Some(match schema {
                Some(s) => s.union(table.schema),
                None => table.schema,
            });
            records.extend(table.records);
        }
        RecordTable {
            records,
            schema: schema.unwrap_or_default(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn schema(&self) -> RecordSchema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
