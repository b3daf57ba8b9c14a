//! FILENAME: core/persistence/src/csv_reader.rs
//! Loads raw survey files and the site metadata sheet.
//!
//! Every survey file holds the records of one taxa group, named by the file
//! stem. Cells are coerced rather than rejected: unparseable dates become the
//! unknown year and unparseable numbers become missing values. Only a missing
//! required column is an error.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use records::{
    normalize_taxagroup, MetadataTable, Record, RecordSchema, RecordTable, SiteId,
    SiteMetadata, Year,
};

use crate::PersistenceError;

// ============================================================================
// HEADER LOOKUP
// ============================================================================

/// Column positions of a CSV header row, matched case-insensitively.
struct Columns {
    names: Vec<String>,
    source_name: String,
}

impl Columns {
    fn new(header: &StringRecord, source_name: &str) -> Self {
        Columns {
            names: header.iter().map(|h| h.trim().to_lowercase()).collect(),
            source_name: source_name.to_string(),
        }
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.names.iter().position(|n| n == column)
    }

    fn required(&self, column: &str) -> Result<usize, PersistenceError> {
        self.optional(column)
            .ok_or_else(|| PersistenceError::MissingColumn {
                column: column.to_string(),
                source_name: self.source_name.clone(),
            })
    }
}

/// The trimmed cell at `index`, or `None` when absent or empty.
fn cell(row: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_number(text: Option<&str>) -> Option<f64> {
    text.and_then(|t| t.parse::<f64>().ok()).filter(|v| v.is_finite())
}

/// Years may be stored as floats (`2019.0`); the fraction is dropped.
fn parse_year(text: Option<&str>) -> Option<i64> {
    let text = text?;
    text.parse::<i64>()
        .ok()
        .or_else(|| parse_number(Some(text)).map(|v| v.trunc() as i64))
}

fn reader_for<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(input)
}

fn is_csv(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"))
}

// ============================================================================
// SURVEY RECORDS
// ============================================================================

/// Loads every `*.csv` file of `dir` (in file-name order) into one table.
pub fn load_survey_dir(dir: &Path) -> Result<RecordTable, PersistenceError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if is_csv(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        log::warn!("no survey files found in {}", dir.display());
    }

    let tables = paths
        .iter()
        .map(|path| load_survey_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    let table = RecordTable::concat(tables);
    log::info!(
        "loaded {} records from {} survey files in {}",
        table.len(),
        paths.len(),
        dir.display()
    );
    Ok(table)
}

/// Loads one survey file; its stem names the taxa group.
pub fn load_survey_file(path: &Path) -> Result<RecordTable, PersistenceError> {
    let taxagroup = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            PersistenceError::InvalidFormat(format!("no taxa group in file name {}", path.display()))
        })?;
    let file = File::open(path)?;
    read_survey(file, taxagroup, &path.display().to_string())
}

/// Reads survey records of one taxa group from CSV text.
pub fn read_survey<R: Read>(
    input: R,
    taxagroup: &str,
    source_name: &str,
) -> Result<RecordTable, PersistenceError> {
    let mut reader = reader_for(input);
    let columns = Columns::new(reader.headers()?, source_name);
    let siteid = columns.required("siteid")?;
    let datecollected = columns.required("datecollected")?;
    let taxaname = columns.optional("taxaname");

    let taxagroup = normalize_taxagroup(taxagroup);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut unknown_years = 0usize;

    for row in reader.records() {
        let row = row?;
        let Some(site) = cell(&row, Some(siteid)) else {
            skipped += 1;
            continue;
        };
        let year = cell(&row, Some(datecollected))
            .map(Year::from_collection_date)
            .unwrap_or(Year::Unknown);
        if !year.is_known() {
            unknown_years += 1;
        }

        let mut record = Record::new(SiteId::new(site), taxagroup.clone(), year);
        record.taxaname = cell(&row, taxaname).map(str::to_string);
        records.push(record);
    }

    if skipped > 0 {
        log::warn!("{}: skipped {} rows without a siteid", source_name, skipped);
    }
    if unknown_years > 0 {
        log::debug!("{}: {} rows with an unknown year", source_name, unknown_years);
    }

    Ok(RecordTable::with_schema(
        records,
        RecordSchema {
            has_taxaname: taxaname.is_some(),
        },
    ))
}

// ============================================================================
// SITE METADATA
// ============================================================================

pub fn load_metadata(path: &Path) -> Result<MetadataTable, PersistenceError> {
    let file = File::open(path)?;
    let table = read_metadata(file, &path.display().to_string())?;
    log::info!("loaded {} metadata rows from {}", table.len(), path.display());
    Ok(table)
}

/// Reads the site metadata sheet from CSV text.
pub fn read_metadata<R: Read>(input: R, source_name: &str) -> Result<MetadataTable, PersistenceError> {
    let mut reader = reader_for(input);
    let columns = Columns::new(reader.headers()?, source_name);
    let siteid = columns.required("siteid")?;
    let taxagroup = columns.required("taxagroup")?;
    let sitename = columns.optional("sitename");
    let latitude = columns.optional("decimallatitude");
    let longitude = columns.optional("decimallongitude");
    let start = columns.optional("startyearcollected");
    let end = columns.optional("endyearcollected");

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let (Some(site), Some(group)) = (cell(&row, Some(siteid)), cell(&row, Some(taxagroup))) else {
            log::warn!("{}: skipped metadata row without siteid or taxagroup", source_name);
            continue;
        };

        rows.push(SiteMetadata {
            siteid: SiteId::new(site),
            taxagroup: normalize_taxagroup(group),
            sitename: cell(&row, sitename).map(str::to_string),
            decimallatitude: parse_number(cell(&row, latitude)),
            decimallongitude: parse_number(cell(&row, longitude)),
            startyearcollected: parse_year(cell(&row, start)),
            endyearcollected: parse_year(cell(&row, end)),
        });
    }

    Ok(MetadataTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_survey_coerces_cells() {
        let text = "siteid,datecollected,taxaname\n\
                    1,2020-03-04,Chromis\n\
                    2,12/31/2019,\n\
                    3,not a date,Ulva\n\
                    ,2020-01-01,Orphan\n";
        let table = read_survey(text.as_bytes(), "Fish", "fish.csv").unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.schema().has_taxaname);
        let rows = table.records();
        assert_eq!(rows[0].taxagroup, "fish");
        assert_eq!(rows[0].year, Year::Known(2020));
        assert_eq!(rows[0].taxaname.as_deref(), Some("Chromis"));
        assert_eq!(rows[1].year, Year::Known(2019));
        assert_eq!(rows[1].taxaname, None);
        assert_eq!(rows[2].year, Year::Unknown);
    }

    #[test]
    fn test_read_survey_without_taxaname_column() {
        let text = "SiteID,DateCollected,temperature\nA,2018,21.5\n";
        let table = read_survey(text.as_bytes(), "water", "water.csv").unwrap();
        assert!(!table.schema().has_taxaname);
        assert_eq!(table.records()[0].siteid.as_str(), "A");
        assert_eq!(table.records()[0].year, Year::Known(2018));
    }

    #[test]
    fn test_missing_required_column() {
        let text = "siteid,taxaname\n1,Chromis\n";
        let err = read_survey(text.as_bytes(), "fish", "fish.csv").unwrap_err();
        match err {
            PersistenceError::MissingColumn { column, source_name } => {
                assert_eq!(column, "datecollected");
                assert_eq!(source_name, "fish.csv");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_metadata_parses_numbers() {
        let text = "siteid,taxagroup,sitename,decimallatitude,decimallongitude,startyearcollected,endyearcollected\n\
                    1,Fish,Reef A,-16.5,145.25,2010.0,2020\n\
                    2,water,,abc,,,\n";
        let table = read_metadata(text.as_bytes(), "metadata.csv").unwrap();
        let rows = table.rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].taxagroup, "fish");
        assert_eq!(rows[0].sitename.as_deref(), Some("Reef A"));
        assert_eq!(rows[0].decimallatitude, Some(-16.5));
        assert_eq!(rows[0].startyearcollected, Some(2010));
        assert_eq!(rows[0].endyearcollected, Some(2020));
        assert_eq!(rows[1].sitename, None);
        assert_eq!(rows[1].decimallatitude, None);
        assert_eq!(rows[1].startyearcollected, None);
    }

    #[test]
    fn test_metadata_requires_taxagroup() {
        let err = read_metadata("siteid,sitename\n1,Reef\n".as_bytes(), "m.csv").unwrap_err();
        assert!(err.to_string().contains("taxagroup"));
    }

    #[test]
    fn test_load_survey_dir_in_name_order() {
        let dir = tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let mut f = File::create(dir.path().join(name)).unwrap();
            f.write_all(body.as_bytes()).unwrap();
        };
        write("Water.csv", "siteid,datecollected\n2,2021-01-01\n");
        write("fish.csv", "siteid,datecollected,taxaname\n1,2020-01-01,Chromis\n");
        write("notes.txt", "ignored");

        let table = load_survey_dir(dir.path()).unwrap();
        let groups: Vec<&str> = table.iter().map(|r| r.taxagroup.as_str()).collect();

        // Uppercase sorts first.
        assert_eq!(groups, vec!["water", "fish"]);
        assert!(table.schema().has_taxaname);
    }

    #[test]
    fn test_load_survey_dir_missing() {
        let dir = tempdir().unwrap();
        let err = load_survey_dir(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, PersistenceError::Io(_)));
    }
}
