//! FILENAME: core/records/src/site.rs
//! PURPOSE: Site identifiers shared by survey records and site metadata.
//! CONTEXT: Source files carry site ids as either integers or free text.
//! We keep the raw text (so output round-trips exactly) but order ids
//! naturally, so "2" sorts before "10".

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifier of a survey site, as written in the source data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    pub fn new(id: impl Into<String>) -> Self {
        SiteId(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the id as an integer if it is purely numeric.
    pub fn as_number(&self) -> Option<i64> {
        self.0.parse::<i64>().ok()
    }
}

impl Ord for SiteId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SiteId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SiteId {
    fn from(value: &str) -> Self {
        SiteId::new(value)
    }
}

impl From<String> for SiteId {
    fn from(value: String) -> Self {
        SiteId::new(value)
    }
}
