//! FILENAME: core/persistence/src/xlsx_writer.rs

use crate::PersistenceError;
use rust_xlsxwriter::{Format, FormatAlign, Workbook as XlsxWorkbook, Worksheet};
use std::collections::HashSet;
use std::path::Path;
use summary_engine::{SummaryCell, SummaryTable};

/// Excel rejects sheet names longer than this.
const MAX_SHEET_NAME: usize = 31;

/// Characters Excel does not allow in a sheet name.
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Saves every table to its own worksheet, named after its job.
pub fn save_summaries_xlsx(
    tables: &[(String, SummaryTable)],
    path: &Path,
) -> Result<(), PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();
    let numeric_header_format = Format::new().set_bold().set_align(FormatAlign::Right);

    let names = sheet_names(tables.iter().map(|(name, _)| name.as_str()));
    for ((_, table), name) in tables.iter().zip(names) {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(name)?;

        for (col, column) in table.columns.iter().enumerate() {
            let format = if column.is_numeric() {
                &numeric_header_format
            } else {
                &header_format
            };
            worksheet.write_string_with_format(0, col as u16, column.name(), format)?;
        }

        for (row_index, cells) in table.cells().enumerate() {
            let row = row_index as u32 + 1;
            for (col, cell) in cells.iter().enumerate() {
                write_cell(worksheet, row, col as u16, cell)?;
            }
        }

        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofit();
    }

    xlsx.save(path)?;
    log::info!("wrote {} sheets to {}", tables.len(), path.display());
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &SummaryCell,
) -> Result<(), PersistenceError> {
    match cell {
        SummaryCell::Empty => {}
        SummaryCell::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        SummaryCell::Integer(n) => {
            worksheet.write_number(row, col, *n as f64)?;
        }
        SummaryCell::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
    }
    Ok(())
}

/// A valid sheet name for a job: forbidden characters become `_`, leading
/// and trailing apostrophes are dropped, and the result is truncated.
fn sheet_name(job: &str) -> String {
    let cleaned: String = job
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let name: String = cleaned.trim_matches('\'').chars().take(MAX_SHEET_NAME).collect();
    if name.is_empty() {
        "Sheet".to_string()
    } else {
        name
    }
}

/// Sheet names for the jobs in order. Excel compares names case-insensitively,
/// so a name already taken gets a numeric suffix.
fn sheet_names<'a>(jobs: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::new();
    for job in jobs {
        let base = sheet_name(job);
        let mut name = base.clone();
        let mut n = 2;
        while taken.contains(&name.to_lowercase()) {
            let suffix = format!("_{}", n);
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            name = base.chars().take(keep).collect::<String>() + &suffix;
            n += 1;
        }
        taken.insert(name.to_lowercase());
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use records::{MetadataTable, Record, RecordTable, Year};
    use summary_engine::{aggregate, GroupKeySet};
    use tempfile::tempdir;

    #[test]
    fn test_save_summaries_xlsx() {
        let records = RecordTable::new(vec![
            Record::new("1", "fish", Year::Known(2020)).with_taxaname("Chromis"),
            Record::new("2", "fish", Year::Unknown).with_taxaname("Chromis"),
        ]);
        let metadata = MetadataTable::default();
        let tables = vec![
            (
                "map_year_taxagroup".to_string(),
                aggregate(&records, &GroupKeySet::taxagroup(), &metadata).unwrap(),
            ),
            (
                "map_year_taxaname".to_string(),
                aggregate(&records, &GroupKeySet::taxagroup_taxaname(), &metadata).unwrap(),
            ),
        ];

        let dir = tempdir().unwrap();
        let path = dir.path().join("summaries.xlsx");
        save_summaries_xlsx(&tables, &path).unwrap();

        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_sheet_names_are_truncated() {
        let long = "a".repeat(40);
        assert_eq!(sheet_name(&long).len(), MAX_SHEET_NAME);
        assert_eq!(sheet_name("taxaname"), "taxaname");
    }

    #[test]
    fn test_sheet_names_drop_forbidden_characters() {
        assert_eq!(sheet_name("fish/inverts [2020]?"), "fish_inverts _2020__");
        assert_eq!(sheet_name("'quoted'"), "quoted");
        assert_eq!(sheet_name("***"), "___");
        assert_eq!(sheet_name("''"), "Sheet");
    }

    #[test]
    fn test_colliding_sheet_names_get_suffixes() {
        let long_a = format!("{}a", "x".repeat(31));
        let long_b = format!("{}b", "x".repeat(31));
        let names = sheet_names([long_a.as_str(), long_b.as_str(), "Totals", "totals"].into_iter());

        assert_eq!(names[0], "x".repeat(31));
        assert_eq!(names[1], format!("{}_2", "x".repeat(29)));
        assert_eq!(names[2], "Totals");
        assert_eq!(names[3], "totals_2");
        assert!(names.iter().all(|n| n.chars().count() <= MAX_SHEET_NAME));
    }

    #[test]
    fn test_workbook_with_awkward_job_names() {
        let records = RecordTable::new(vec![Record::new("1", "fish", Year::Known(2020))]);
        let table = aggregate(&records, &GroupKeySet::taxagroup(), &MetadataTable::default()).unwrap();
        let tables = vec![
            ("fish/sites".to_string(), table.clone()),
            ("fish:sites".to_string(), table),
        ];

        let dir = tempdir().unwrap();
        let path = dir.path().join("awkward.xlsx");
        save_summaries_xlsx(&tables, &path).unwrap();
        assert!(path.exists());
    }
}
