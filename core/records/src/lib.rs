//! FILENAME: core/records/src/lib.rs
//! PURPOSE: Main library entry point for the normalized survey data model.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod metadata;
pub mod record;
pub mod site;
pub mod table;
pub mod year;

// Re-export commonly used types at the crate root
pub use metadata::{MetadataTable, SiteMetadata};
pub use record::{normalize_taxagroup, Attribute, Record, UnknownAttribute};
pub use site::SiteId;
pub use table::{RecordSchema, RecordTable};
pub use year::Year;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_builds_a_normalized_table() {
        let records = vec![
            Record::new("1", normalize_taxagroup("Fish"), Year::from_collection_date("2020-01-05")),
            Record::new("1", normalize_taxagroup("Fish"), Year::from_collection_date("garbage")),
        ];
        let table = RecordTable::new(records);

        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].taxagroup, "fish");
        assert_eq!(table.records()[0].year, Year::Known(2020));
        assert_eq!(table.records()[1].year, Year::Unknown);
    }
}
