//! FILENAME: core/persistence/src/csv_writer.rs
//! Writes summary tables as CSV.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use summary_engine::{SinkError, SummaryJob, SummarySink, SummaryTable};

use crate::PersistenceError;

/// Writes the header row and every projected row of `table`.
/// Missing values become empty fields.
pub fn write_summary_csv<W: Write>(table: &SummaryTable, output: W) -> Result<(), PersistenceError> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(table.headers())?;
    for row in table.display_rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_summary_csv(table: &SummaryTable, path: &Path) -> Result<(), PersistenceError> {
    let file = fs::File::create(path)?;
    write_summary_csv(table, file)
}

// ============================================================================
// DIRECTORY SINK
// ============================================================================

/// Saves each job's table as `<dir>/<job name>.csv`.
#[derive(Debug)]
pub struct CsvDirSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvDirSink {
    /// Creates the output directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(CsvDirSink {
            dir,
            written: Vec::new(),
        })
    }

    /// Files written so far, in job order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl SummarySink for CsvDirSink {
    fn accept(&mut self, job: &SummaryJob, table: &SummaryTable) -> Result<(), SinkError> {
        let path = self.dir.join(format!("{}.csv", job.name));
        save_summary_csv(table, &path)?;
        log::debug!("wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use records::{MetadataTable, Record, RecordTable, SiteMetadata, Year};
    use summary_engine::{aggregate, run_jobs, GroupKeySet, SummaryDefinition};
    use tempfile::tempdir;

    fn survey() -> RecordTable {
        RecordTable::new(vec![
            Record::new("1", "fish", Year::Known(2020)),
            Record::new("1", "fish", Year::Known(2020)),
            Record::new("1", "fish", Year::Unknown),
        ])
    }

    fn metadata() -> MetadataTable {
        MetadataTable::new(vec![SiteMetadata::new("1", "fish")
            .with_name("Reef, North")
            .with_location(-16.25, 145.5)
            .with_collection_period(2015, 2020)])
    }

    #[test]
    fn test_write_summary_csv() {
        let table = aggregate(&survey(), &GroupKeySet::taxagroup(), &metadata()).unwrap();
        let mut out = Vec::new();
        write_summary_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "year,taxagroup,siteid,sitename,decimallatitude,decimallongitude,age,value,cumulative_value"
        );
        assert_eq!(lines[1], "2020,fish,1,\"Reef, North\",-16.25,145.5,5,2,2");
        assert_eq!(lines[2], ",fish,1,\"Reef, North\",-16.25,145.5,5,1,3");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let table = aggregate(&RecordTable::default(), &GroupKeySet::taxagroup(), &metadata()).unwrap();
        let mut out = Vec::new();
        write_summary_csv(&table, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_dir_sink_names_files_by_job() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("data");
        let mut sink = CsvDirSink::create(&out).unwrap();
        let jobs = vec![SummaryJob::new(
            "totals",
            SummaryDefinition::site_totals(GroupKeySet::taxagroup()),
        )];

        run_jobs(&survey(), &metadata(), &jobs, &mut sink).unwrap();

        assert_eq!(sink.written(), &[out.join("totals.csv")]);
        let text = fs::read_to_string(out.join("totals.csv")).unwrap();
        assert!(text.starts_with("taxagroup,siteid,"));
        assert!(text.contains(",3"));
    }
}
