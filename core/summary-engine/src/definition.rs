//! FILENAME: core/summary-engine/src/definition.rs
//! Summary Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a summary table.
//! These structures are designed to be:
//! - Serializable (for job lists in configuration files)
//! - Validated on construction (a bad key set never reaches the engine)
//! - Immutable snapshots of caller intent

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use records::{Attribute, RecordSchema};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::SummaryError;
use crate::view::SummaryColumn;

// ============================================================================
// GROUP FIELDS
// ============================================================================

/// A record attribute that can be chosen as an extra grouping dimension.
/// `siteid` and `year` are built-in dimensions and are never group fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupField {
    TaxaGroup,
    TaxaName,
}

impl GroupField {
    pub fn attribute(&self) -> Attribute {
        match self {
            GroupField::TaxaGroup => Attribute::TaxaGroup,
            GroupField::TaxaName => Attribute::TaxaName,
        }
    }

    pub fn name(&self) -> &'static str {
        self.attribute().name()
    }

    pub fn column(&self) -> SummaryColumn {
        match self {
            GroupField::TaxaGroup => SummaryColumn::TaxaGroup,
            GroupField::TaxaName => SummaryColumn::TaxaName,
        }
    }
}

impl fmt::Display for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupField {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let attribute = s
            .parse::<Attribute>()
            .map_err(|e| SummaryError::invalid(e.to_string()))?;
        match attribute {
            Attribute::TaxaGroup => Ok(GroupField::TaxaGroup),
            Attribute::TaxaName => Ok(GroupField::TaxaName),
            Attribute::SiteId | Attribute::Year => Err(SummaryError::invalid(format!(
                "'{}' is always a summary dimension and cannot be a group key",
                attribute
            ))),
        }
    }
}

// ============================================================================
// GROUP KEY SET
// ============================================================================

/// Ordered, non-empty, duplicate-free list of group fields.
/// The order is the order of the group columns in the output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct GroupKeySet {
    fields: SmallVec<[GroupField; 2]>,
}

impl GroupKeySet {
    pub fn new(fields: impl IntoIterator<Item = GroupField>) -> Result<Self, SummaryError> {
        let fields: SmallVec<[GroupField; 2]> = fields.into_iter().collect();

        if fields.is_empty() {
            return Err(SummaryError::invalid("group keys must not be empty"));
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].contains(field) {
                return Err(SummaryError::invalid(format!(
                    "duplicate group key '{}'",
                    field
                )));
            }
        }

        Ok(GroupKeySet { fields })
    }

    /// Parses attribute names (e.g. `["taxagroup", "taxaname"]`).
    pub fn parse<I, S>(names: I) -> Result<Self, SummaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = names
            .into_iter()
            .map(|name| name.as_ref().parse::<GroupField>())
            .collect::<Result<Vec<_>, _>>()?;
        GroupKeySet::new(fields)
    }

    pub fn taxagroup() -> Self {
        GroupKeySet { fields: SmallVec::from_slice(&[GroupField::TaxaGroup]) }
    }

    pub fn taxagroup_taxaname() -> Self {
        GroupKeySet {
            fields: SmallVec::from_slice(&[GroupField::TaxaGroup, GroupField::TaxaName]),
        }
    }

    pub fn fields(&self) -> &[GroupField] {
        &self.fields
    }

    pub fn contains(&self, field: GroupField) -> bool {
        self.fields.contains(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = GroupField> + '_ {
        self.fields.iter().copied()
    }
}

impl TryFrom<Vec<String>> for GroupKeySet {
    type Error = SummaryError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        GroupKeySet::parse(names)
    }
}

impl From<GroupKeySet> for Vec<String> {
    fn from(keys: GroupKeySet) -> Self {
        keys.fields.iter().map(|f| f.name().to_string()).collect()
    }
}

// ============================================================================
// ORDERING & KINDS
// ============================================================================

/// Final row order of a summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOrder {
    /// Stable sort by `value`, largest first.
    #[default]
    ValueDescending,
    /// Ascending by year, then the group keys, then site.
    Grouping,
}

/// The summary shapes produced by the survey pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// Per year and site, cumulative, enriched with site metadata.
    SiteTimeline,
    /// Per site over all years, enriched with site metadata.
    SiteTotals,
    /// Per year over all sites, cumulative.
    YearlyTotals,
    /// Per year over all sites.
    YearlyCounts,
}

impl SummaryKind {
    pub fn definition(&self, group_keys: GroupKeySet) -> SummaryDefinition {
        match self {
            SummaryKind::SiteTimeline => SummaryDefinition::site_timeline(group_keys),
            SummaryKind::SiteTotals => SummaryDefinition::site_totals(group_keys),
            SummaryKind::YearlyTotals => SummaryDefinition::yearly_totals(group_keys),
            SummaryKind::YearlyCounts => SummaryDefinition::yearly_counts(group_keys),
        }
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete description of one summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDefinition {
    /// Extra grouping dimensions, in output column order.
    pub group_keys: GroupKeySet,

    /// Partition by collection year.
    pub by_year: bool,

    /// Partition by site.
    pub by_site: bool,

    /// Compute running totals over increasing year.
    pub cumulative: bool,

    /// Left-join site metadata and derive `age`. Requires `by_site`.
    pub enrich: bool,

    /// When set, only records of these taxa groups are counted.
    #[serde(default)]
    pub taxagroup_filter: Option<BTreeSet<String>>,

    #[serde(default)]
    pub order: SummaryOrder,
}

impl SummaryDefinition {
    /// Year x site x keys counts with running totals and site metadata.
    pub fn site_timeline(group_keys: GroupKeySet) -> Self {
        SummaryDefinition {
            group_keys,
            by_year: true,
            by_site: true,
            cumulative: true,
            enrich: true,
            taxagroup_filter: None,
            order: SummaryOrder::ValueDescending,
        }
    }

    /// Site x keys counts over all years, with site metadata.
    pub fn site_totals(group_keys: GroupKeySet) -> Self {
        SummaryDefinition {
            group_keys,
            by_year: false,
            by_site: true,
            cumulative: false,
            enrich: true,
            taxagroup_filter: None,
            order: SummaryOrder::ValueDescending,
        }
    }

    /// Year x keys counts over all sites, with running totals.
    pub fn yearly_totals(group_keys: GroupKeySet) -> Self {
        SummaryDefinition {
            group_keys,
            by_year: true,
            by_site: false,
            cumulative: true,
            enrich: false,
            taxagroup_filter: None,
            order: SummaryOrder::Grouping,
        }
    }

    /// Year x keys counts over all sites.
    pub fn yearly_counts(group_keys: GroupKeySet) -> Self {
        SummaryDefinition {
            group_keys,
            by_year: true,
            by_site: false,
            cumulative: false,
            enrich: false,
            taxagroup_filter: None,
            order: SummaryOrder::Grouping,
        }
    }

    /// Restricts the summary to the given taxa groups.
    pub fn with_taxagroup_filter<I, S>(mut self, taxagroups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.taxagroup_filter = Some(taxagroups.into_iter().map(Into::into).collect());
        self
    }

    /// Checks the definition against the columns the records actually carry.
    pub fn validate(&self, schema: RecordSchema) -> Result<(), SummaryError> {
        if self.group_keys.is_empty() {
            return Err(SummaryError::invalid("group keys must not be empty"));
        }
        for field in self.group_keys.iter() {
            if !schema.contains(field.attribute()) {
                return Err(SummaryError::invalid(format!(
                    "group key '{}' is not a column of the record table",
                    field
                )));
            }
        }
        if self.enrich && !self.by_site {
            return Err(SummaryError::invalid(
                "metadata enrichment requires partitioning by site",
            ));
        }
        Ok(())
    }

    /// Whether rows carry the (siteid, taxagroup) join key.
    pub fn joins_metadata(&self) -> bool {
        self.enrich && self.group_keys.contains(GroupField::TaxaGroup)
    }

    /// The output columns, in order.
    pub fn projection(&self) -> Vec<SummaryColumn> {
        let mut columns = Vec::with_capacity(9);
        if self.by_year {
            columns.push(SummaryColumn::Year);
        }
        columns.extend(self.group_keys.iter().map(|f| f.column()));
        if self.by_site {
            columns.push(SummaryColumn::SiteId);
        }
        if self.enrich {
            columns.extend([
                SummaryColumn::SiteName,
                SummaryColumn::Latitude,
                SummaryColumn::Longitude,
                SummaryColumn::Age,
            ]);
        }
        columns.push(SummaryColumn::Value);
        if self.cumulative {
            columns.push(SummaryColumn::CumulativeValue);
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_keys_rejected() {
        let result = GroupKeySet::new(Vec::new());
        assert!(matches!(result, Err(SummaryError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let result = GroupKeySet::parse(["taxagroup", "taxaname", "taxagroup"]);
        assert!(matches!(result, Err(SummaryError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_builtin_dimensions_rejected() {
        assert!(GroupKeySet::parse(["siteid"]).is_err());
        assert!(GroupKeySet::parse(["taxagroup", "year"]).is_err());
        assert!(GroupKeySet::parse(["depth"]).is_err());
    }

    #[test]
    fn test_key_order_preserved() {
        let keys = GroupKeySet::parse(["taxaname", "taxagroup"]).unwrap();
        assert_eq!(keys.fields(), &[GroupField::TaxaName, GroupField::TaxaGroup]);
    }

    #[test]
    fn test_absent_column_rejected() {
        let definition = SummaryDefinition::site_timeline(GroupKeySet::taxagroup_taxaname());
        let schema = RecordSchema { has_taxaname: false };
        assert!(matches!(
            definition.validate(schema),
            Err(SummaryError::InvalidConfiguration(_))
        ));
        assert!(definition.validate(RecordSchema::default()).is_ok());
    }

    #[test]
    fn test_enrich_requires_site() {
        let mut definition = SummaryDefinition::yearly_totals(GroupKeySet::taxagroup());
        definition.enrich = true;
        assert!(definition.validate(RecordSchema::default()).is_err());
    }

    #[test]
    fn test_site_timeline_projection() {
        let definition = SummaryDefinition::site_timeline(GroupKeySet::taxagroup_taxaname());
        let names: Vec<&str> = definition.projection().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "year", "taxagroup", "taxaname", "siteid", "sitename",
                "decimallatitude", "decimallongitude", "age", "value", "cumulative_value",
            ]
        );
    }

    #[test]
    fn test_variant_projections() {
        let totals = SummaryDefinition::site_totals(GroupKeySet::taxagroup());
        let names: Vec<&str> = totals.projection().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "taxagroup", "siteid", "sitename", "decimallatitude",
                "decimallongitude", "age", "value",
            ]
        );

        let yearly = SummaryDefinition::yearly_totals(GroupKeySet::taxagroup());
        let names: Vec<&str> = yearly.projection().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["year", "taxagroup", "value", "cumulative_value"]);
    }

    #[test]
    fn test_key_set_serde() {
        let keys: GroupKeySet = serde_json::from_str(r#"["taxagroup","taxaname"]"#).unwrap();
        assert_eq!(keys, GroupKeySet::taxagroup_taxaname());
        assert_eq!(serde_json::to_string(&keys).unwrap(), r#"["taxagroup","taxaname"]"#);
        assert!(serde_json::from_str::<GroupKeySet>("[]").is_err());
    }
}
