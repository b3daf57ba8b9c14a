//! FILENAME: core/summary-engine/src/view.rs
//! Summary View - Typed output rows and their tabular projection.
//!
//! Rows keep every field statically typed; the column list of a table
//! decides which of them a serializer renders, and in what order.

use records::{SiteId, Year};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::definition::GroupField;

// ============================================================================
// COLUMNS
// ============================================================================

/// An output column of a summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SummaryColumn {
    Year,
    TaxaGroup,
    TaxaName,
    SiteId,
    SiteName,
    Latitude,
    Longitude,
    Age,
    Value,
    CumulativeValue,
}

impl SummaryColumn {
    /// Header name used in serialized tables.
    pub fn name(&self) -> &'static str {
        match self {
            SummaryColumn::Year => "year",
            SummaryColumn::TaxaGroup => "taxagroup",
            SummaryColumn::TaxaName => "taxaname",
            SummaryColumn::SiteId => "siteid",
            SummaryColumn::SiteName => "sitename",
            SummaryColumn::Latitude => "decimallatitude",
            SummaryColumn::Longitude => "decimallongitude",
            SummaryColumn::Age => "age",
            SummaryColumn::Value => "value",
            SummaryColumn::CumulativeValue => "cumulative_value",
        }
    }

    /// Whether the column holds numbers (right-aligned in workbooks).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SummaryColumn::Latitude
                | SummaryColumn::Longitude
                | SummaryColumn::Age
                | SummaryColumn::Value
                | SummaryColumn::CumulativeValue
        )
    }
}

// ============================================================================
// CELL VALUES
// ============================================================================

/// Display value for one cell of a summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SummaryCell {
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
}

impl SummaryCell {
    /// Renders the cell as plain text; numbers as plain decimals.
    pub fn display(&self) -> String {
        match self {
            SummaryCell::Empty => String::new(),
            SummaryCell::Text(s) => s.clone(),
            SummaryCell::Integer(n) => n.to_string(),
            SummaryCell::Number(n) => format!("{}", n),
        }
    }
}

impl From<Option<&str>> for SummaryCell {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(s) => SummaryCell::Text(s.to_string()),
            None => SummaryCell::Empty,
        }
    }
}

// ============================================================================
// SUMMARY ROW
// ============================================================================

/// One aggregated, optionally enriched, output row.
/// Fields a summary variant does not produce are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub year: Option<Year>,
    pub taxagroup: Option<String>,
    pub taxaname: Option<String>,
    pub siteid: Option<SiteId>,
    pub sitename: Option<String>,
    pub decimallatitude: Option<f64>,
    pub decimallongitude: Option<f64>,
    /// Filled with 0 after the metadata join when no year is known.
    pub startyearcollected: Option<i64>,
    pub endyearcollected: Option<i64>,
    pub age: Option<i64>,
    /// Number of records in the partition.
    pub value: u64,
    /// Running total of `value` over increasing year.
    pub cumulative_value: Option<u64>,
}

impl SummaryRow {
    /// A bare counted row with no dimensions or metadata filled in yet.
    pub fn counted(value: u64) -> Self {
        SummaryRow {
            year: None,
            taxagroup: None,
            taxaname: None,
            siteid: None,
            sitename: None,
            decimallatitude: None,
            decimallongitude: None,
            startyearcollected: None,
            endyearcollected: None,
            age: None,
            value,
            cumulative_value: None,
        }
    }

    pub fn group_value(&self, field: GroupField) -> Option<&str> {
        match field {
            GroupField::TaxaGroup => self.taxagroup.as_deref(),
            GroupField::TaxaName => self.taxaname.as_deref(),
        }
    }

    pub fn cell(&self, column: SummaryColumn) -> SummaryCell {
        match column {
            SummaryColumn::Year => match self.year {
                Some(Year::Known(y)) => SummaryCell::Integer(y as i64),
                Some(Year::Unknown) | None => SummaryCell::Empty,
            },
            SummaryColumn::TaxaGroup => self.taxagroup.as_deref().into(),
            SummaryColumn::TaxaName => self.taxaname.as_deref().into(),
            SummaryColumn::SiteId => self.siteid.as_ref().map(|s| s.as_str()).into(),
            SummaryColumn::SiteName => self.sitename.as_deref().into(),
            SummaryColumn::Latitude => self.decimallatitude.map_or(SummaryCell::Empty, SummaryCell::Number),
            SummaryColumn::Longitude => self.decimallongitude.map_or(SummaryCell::Empty, SummaryCell::Number),
            SummaryColumn::Age => self.age.map_or(SummaryCell::Empty, SummaryCell::Integer),
            SummaryColumn::Value => SummaryCell::Integer(self.value as i64),
            SummaryColumn::CumulativeValue => self
                .cumulative_value
                .map_or(SummaryCell::Empty, |v| SummaryCell::Integer(v as i64)),
        }
    }
}

// ============================================================================
// SUMMARY TABLE
// ============================================================================

/// The result of one summary calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Output columns in order.
    pub columns: Vec<SummaryColumn>,
    /// Rows in final output order.
    pub rows: Vec<SummaryRow>,
    /// Build statistics of the underlying partition cache.
    pub stats: CacheStats,
}

impl SummaryTable {
    pub fn new(columns: Vec<SummaryColumn>, rows: Vec<SummaryRow>) -> Self {
        SummaryTable {
            columns,
            rows,
            stats: CacheStats::default(),
        }
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Projected cells of every row, in column order.
    pub fn cells(&self) -> impl Iterator<Item = Vec<SummaryCell>> + '_ {
        self.rows
            .iter()
            .map(move |row| self.columns.iter().map(|&c| row.cell(c)).collect())
    }

    /// Projected rows rendered as text.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.cells()
            .map(|cells| cells.iter().map(SummaryCell::display).collect())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of `value` over all rows.
    pub fn total_value(&self) -> u64 {
        self.rows.iter().map(|r| r.value).sum()
    }
}
