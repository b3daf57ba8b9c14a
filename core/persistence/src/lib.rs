//! FILENAME: core/persistence/src/lib.rs
//! Survey Persistence Module
//!
//! Reads raw survey files and the site metadata sheet from CSV, and writes
//! summary tables as CSV files or as one XLSX workbook.

mod csv_reader;
mod csv_writer;
mod error;
mod xlsx_writer;

pub use csv_reader::{load_metadata, load_survey_dir, load_survey_file, read_metadata, read_survey};
pub use csv_writer::{save_summary_csv, write_summary_csv, CsvDirSink};
pub use error::PersistenceError;
pub use xlsx_writer::save_summaries_xlsx;
