//! FILENAME: app/src/lib.rs
// PURPOSE: Batch pipeline: load raw surveys and site metadata, run the
// summary jobs, write one CSV per job and optionally one workbook.

use std::path::Path;

use persistence::{load_metadata, load_survey_dir, save_summaries_xlsx, CsvDirSink};
use records::{MetadataTable, RecordTable};
use summary_engine::{
    run_jobs, CollectingSink, PipelineReport, SinkError, SummaryJob, SummarySink, SummaryTable,
};

pub mod config;
pub mod error;
pub mod logging;

pub use config::{JobConfig, PipelineConfig};
pub use error::AppError;
pub use logging::{install_log_bridge, init_log_file, write_log};

// ============================================================================
// OUTPUT
// ============================================================================

/// Writes each table as CSV and, when a workbook is requested, keeps a copy.
pub struct OutputSink {
    csv: CsvDirSink,
    workbook: Option<CollectingSink>,
}

impl OutputSink {
    pub fn create(output_dir: &Path, keep_tables: bool) -> Result<Self, AppError> {
        Ok(OutputSink {
            csv: CsvDirSink::create(output_dir)?,
            workbook: keep_tables.then(CollectingSink::new),
        })
    }

    pub fn csv(&self) -> &CsvDirSink {
        &self.csv
    }

    pub fn tables(&self) -> &[(String, SummaryTable)] {
        match &self.workbook {
            Some(workbook) => &workbook.tables,
            None => &[],
        }
    }
}

impl SummarySink for OutputSink {
    fn accept(&mut self, job: &SummaryJob, table: &SummaryTable) -> Result<(), SinkError> {
        self.csv.accept(job, table)?;
        if let Some(workbook) = self.workbook.as_mut() {
            workbook.accept(job, table)?;
        }
        Ok(())
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Loads the record table and the metadata sheet named by the config.
pub fn load_inputs(config: &PipelineConfig) -> Result<(RecordTable, MetadataTable), AppError> {
    log_enter!("LOAD", "load_inputs", "raw_dir={}", config.raw_dir.display());

    let records = load_survey_dir(&config.raw_dir)?;
    if records.is_empty() {
        log_warn!("LOAD", "no survey records in {}", config.raw_dir.display());
    }
    let metadata = load_metadata(&config.metadata_path)?;

    log_exit!("LOAD", "load_inputs", "records={} metadata={}", records.len(), metadata.len());
    Ok((records, metadata))
}

/// Runs every configured job and writes its outputs.
pub fn run_with_config(config: &PipelineConfig) -> Result<PipelineReport, AppError> {
    log_enter_info!("PIPE", "run_with_config", "output_dir={}", config.output_dir.display());

    let (records, metadata) = load_inputs(config)?;
    let jobs = config.jobs();
    log_debug!("PIPE", "{} jobs configured", jobs.len());

    let mut sink = OutputSink::create(&config.output_dir, config.xlsx_path.is_some())?;
    let report = run_jobs(&records, &metadata, &jobs, &mut sink)?;

    if let Some(xlsx_path) = &config.xlsx_path {
        save_summaries_xlsx(sink.tables(), xlsx_path)?;
    }

    log_exit_info!("PIPE", "run_with_config", "files={}", sink.csv().written().len());
    Ok(report)
}

fn init_logging(config: &PipelineConfig) -> Result<(), AppError> {
    let level = config.level_filter()?;
    if let Some(log_path) = &config.log_path {
        match init_log_file(log_path) {
            Ok(path) => log_info!("SYS", "log={}", path.display()),
            Err(e) => {
                eprintln!("[LOG_INIT] FAILED: {}", e);
                eprintln!("[LOG_INIT] Continuing with console-only logging");
            }
        }
    }
    install_log_bridge(level);
    Ok(())
}

/// Command-line entry: `app [CONFIG.json]`. Returns the process exit code.
pub fn run() -> i32 {
    let config = match std::env::args_os().nth(1) {
        Some(path) => match PipelineConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                log_error!("SYS", "{}", e);
                return 1;
            }
        },
        None => PipelineConfig::default(),
    };

    if let Err(e) = init_logging(&config) {
        log_error!("SYS", "{}", e);
        return 1;
    }

    match run_with_config(&config) {
        Ok(report) => {
            for (job, rows) in &report.jobs {
                log_info!("PIPE", "{}: {} rows", job, rows);
            }
            0
        }
        Err(e) => {
            log_error!("PIPE", "{}", e);
            1
        }
    }
}
