//! FILENAME: core/summary-engine/src/lib.rs
//! Survey summary subsystem.
//!
//! This crate turns the normalized record table into grouped, cumulative,
//! metadata-enriched summary tables. It depends on `records` only for the
//! shared data model (Record, RecordTable, MetadataTable).
//!
//! Layers:
//! - `definition`: Serializable configuration (what the summary IS)
//! - `cache`: Interned partition counts (HOW we count)
//! - `view`: Typed rows and column projection (WHAT we output)
//! - `engine`: Calculation engine (HOW we calculate)
//! - `pipeline`: Job lists and output sinks

pub mod cache;
pub mod definition;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod view;

pub use cache::{CacheStats, Dimension, PartitionCache};
pub use definition::*;
pub use engine::{aggregate, calculate_summary, MetadataIndex, SummaryCalculator};
pub use error::SummaryError;
pub use pipeline::{
    default_jobs, run_jobs, CollectingSink, PipelineError, PipelineReport, SinkError,
    SummaryJob, SummarySink, SPECIES_TAXAGROUPS,
};
pub use view::*;
