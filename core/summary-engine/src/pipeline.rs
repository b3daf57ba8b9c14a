//! FILENAME: core/summary-engine/src/pipeline.rs
//! Summary Pipeline - Runs a list of summary jobs and routes the results.
//!
//! Each job is one parameterization of the engine. The pipeline evaluates
//! jobs in order against the same records and metadata and hands every
//! finished table to a sink supplied by the caller (files, memory, ...).

use records::{MetadataTable, RecordTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::definition::{GroupKeySet, SummaryDefinition};
use crate::engine::calculate_summary;
use crate::error::SummaryError;
use crate::view::SummaryTable;

/// Taxa groups summarized by species in the standard job list.
pub const SPECIES_TAXAGROUPS: &[&str] = &["fish", "invertebrates", "macroalgae", "phytoplankton"];

// ============================================================================
// JOBS
// ============================================================================

/// A named summary to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryJob {
    /// Job name; sinks use it to name their output.
    pub name: String,
    pub definition: SummaryDefinition,
}

impl SummaryJob {
    pub fn new(name: impl Into<String>, definition: SummaryDefinition) -> Self {
        SummaryJob {
            name: name.into(),
            definition,
        }
    }
}

/// The standard survey summaries.
pub fn default_jobs() -> Vec<SummaryJob> {
    vec![
        SummaryJob::new(
            "map_year_taxagroup",
            SummaryDefinition::site_timeline(GroupKeySet::taxagroup()),
        ),
        SummaryJob::new(
            "map_year_taxaname",
            SummaryDefinition::site_timeline(GroupKeySet::taxagroup_taxaname()),
        ),
        SummaryJob::new(
            "map_taxagroup",
            SummaryDefinition::site_totals(GroupKeySet::taxagroup()),
        ),
        SummaryJob::new(
            "taxagroup",
            SummaryDefinition::yearly_totals(GroupKeySet::taxagroup()),
        ),
        SummaryJob::new(
            "taxaname",
            SummaryDefinition::yearly_counts(GroupKeySet::taxagroup_taxaname())
                .with_taxagroup_filter(SPECIES_TAXAGROUPS.iter().copied()),
        ),
    ]
}

// ============================================================================
// SINKS
// ============================================================================

/// Error type sinks report; the pipeline attaches the job name.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Destination for finished summary tables.
pub trait SummarySink {
    fn accept(&mut self, job: &SummaryJob, table: &SummaryTable) -> Result<(), SinkError>;
}

/// Keeps every table in memory, in job order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub tables: Vec<(String, SummaryTable)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&SummaryTable> {
        self.tables
            .iter()
            .find(|(job, _)| job == name)
            .map(|(_, table)| table)
    }
}

impl SummarySink for CollectingSink {
    fn accept(&mut self, job: &SummaryJob, table: &SummaryTable) -> Result<(), SinkError> {
        self.tables.push((job.name.clone(), table.clone()));
        Ok(())
    }
}

// ============================================================================
// RUNNER
// ============================================================================

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("job '{job}' failed: {source}")]
    Summary {
        job: String,
        #[source]
        source: SummaryError,
    },

    #[error("job '{job}' could not be written: {source}")]
    Sink {
        job: String,
        #[source]
        source: SinkError,
    },
}

/// Row counts of the tables a run produced, in job order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub jobs: Vec<(String, usize)>,
}

/// Evaluates each job and routes its table to the sink.
/// Stops at the first failing job.
pub fn run_jobs(
    records: &RecordTable,
    metadata: &MetadataTable,
    jobs: &[SummaryJob],
    sink: &mut dyn SummarySink,
) -> Result<PipelineReport, PipelineError> {
    let mut report = PipelineReport::default();

    for job in jobs {
        let table = calculate_summary(records, &job.definition, metadata).map_err(|source| {
            PipelineError::Summary {
                job: job.name.clone(),
                source,
            }
        })?;

        log::info!(
            "job={} rows={} total={}",
            job.name,
            table.len(),
            table.total_value()
        );

        sink.accept(job, &table).map_err(|source| PipelineError::Sink {
            job: job.name.clone(),
            source,
        })?;
        report.jobs.push((job.name.clone(), table.len()));
    }

    Ok(report)
}
