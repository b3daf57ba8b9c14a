//! FILENAME: core/records/src/metadata.rs
//! PURPOSE: Descriptive data about a (site, taxa group) pairing.
//! CONTEXT: Metadata rows are joined onto aggregated rows by
//! (`siteid`, `taxagroup`). Every descriptive field is optional because the
//! source sheet is hand-maintained and frequently incomplete.

use serde::{Deserialize, Serialize};

use crate::site::SiteId;

/// One row of the site metadata sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMetadata {
    pub siteid: SiteId,
    /// Lower-cased taxa group this row describes.
    pub taxagroup: String,
    pub sitename: Option<String>,
    pub decimallatitude: Option<f64>,
    pub decimallongitude: Option<f64>,
    pub startyearcollected: Option<i64>,
    pub endyearcollected: Option<i64>,
}

impl SiteMetadata {
    /// Creates a metadata row with every descriptive field missing.
    pub fn new(siteid: impl Into<SiteId>, taxagroup: impl Into<String>) -> Self {
        SiteMetadata {
            siteid: siteid.into(),
            taxagroup: taxagroup.into(),
            sitename: None,
            decimallatitude: None,
            decimallongitude: None,
            startyearcollected: None,
            endyearcollected: None,
        }
    }

    pub fn with_name(mut self, sitename: impl Into<String>) -> Self {
        self.sitename = Some(sitename.into());
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.decimallatitude = Some(latitude);
        self.decimallongitude = Some(longitude);
        self
    }

    pub fn with_collection_period(mut self, start: i64, end: i64) -> Self {
        self.startyearcollected = Some(start);
        self.endyearcollected = Some(end);
        self
    }
}

/// The metadata sheet. Expected to hold at most one row per
/// (`siteid`, `taxagroup`); duplicates are tolerated by the join.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataTable {
    rows: Vec<SiteMetadata>,
}

impl MetadataTable {
    pub fn new(rows: Vec<SiteMetadata>) -> Self {
        MetadataTable { rows }
    }

    pub fn rows(&self) -> &[SiteMetadata] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteMetadata> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
