//! FILENAME: core/records/src/record.rs
//! PURPOSE: Defines a single survey observation and its named attributes.
//! CONTEXT: A `Record` is produced once by the normalizer and never mutated.
//! Aggregations address its attributes by name through `Attribute`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::site::SiteId;
use crate::year::Year;

/// One normalized observation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub siteid: SiteId,
    /// Lower-cased taxa group (one per source file).
    pub taxagroup: String,
    /// Species / taxon identifier, when the source provides one.
    pub taxaname: Option<String>,
    pub year: Year,
}

impl Record {
    pub fn new(siteid: impl Into<SiteId>, taxagroup: impl Into<String>, year: Year) -> Self {
        Record {
            siteid: siteid.into(),
            taxagroup: taxagroup.into(),
            taxaname: None,
            year,
        }
    }

    pub fn with_taxaname(mut self, taxaname: impl Into<String>) -> Self {
        self.taxaname = Some(taxaname.into());
        self
    }
}

/// Names of the attributes a record exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    SiteId,
    TaxaGroup,
    TaxaName,
    Year,
}

impl Attribute {
    /// Column name used in source files and summary headers.
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::SiteId => "siteid",
            Attribute::TaxaGroup => "taxagroup",
            Attribute::TaxaName => "taxaname",
            Attribute::Year => "year",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for attribute names that records do not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttribute(pub String);

impl fmt::Display for UnknownAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown record attribute '{}'", self.0)
    }
}

impl std::error::Error for UnknownAttribute {}

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "siteid" => Ok(Attribute::SiteId),
            "taxagroup" => Ok(Attribute::TaxaGroup),
            "taxaname" => Ok(Attribute::TaxaName),
            "year" => Ok(Attribute::Year),
            other => Err(UnknownAttribute(other.to_string())),
        }
    }
}

/// Canonical form of a taxa group label (trimmed, lower-case).
pub fn normalize_taxagroup(raw: &str) -> String {
    raw.trim().to_lowercase()
}
