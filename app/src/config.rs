//! FILENAME: app/src/config.rs
//! PURPOSE: Run configuration, read from an optional JSON file.
//! CONTEXT: Every field has a default, so `{}` is a valid configuration and
//! running without a file reproduces the standard layout (`./raw`,
//! `./data/metadata.csv`, `./data`) and the standard job list.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use summary_engine::{default_jobs, GroupKeySet, SummaryJob, SummaryKind};

use crate::error::AppError;

/// One configured summary job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub kind: SummaryKind,
    pub group_keys: GroupKeySet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxagroup_filter: Option<Vec<String>>,
}

impl JobConfig {
    pub fn to_job(&self) -> SummaryJob {
        let mut definition = self.kind.definition(self.group_keys.clone());
        if let Some(filter) = &self.taxagroup_filter {
            definition = definition.with_taxagroup_filter(filter.iter().map(|g| g.to_lowercase()));
        }
        SummaryJob::new(self.name.clone(), definition)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory of raw survey files, one `<taxagroup>.csv` per group.
    pub raw_dir: PathBuf,
    pub metadata_path: PathBuf,
    /// Receives one `<job name>.csv` per job.
    pub output_dir: PathBuf,
    /// Also write every table into one workbook.
    pub xlsx_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub log_level: String,
    /// Replaces the standard job list when present.
    pub jobs: Option<Vec<JobConfig>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            raw_dir: PathBuf::from("./raw"),
            metadata_path: PathBuf::from("./data/metadata.csv"),
            output_dir: PathBuf::from("./data"),
            xlsx_path: None,
            log_path: None,
            log_level: "info".to_string(),
            jobs: None,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|source| AppError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn jobs(&self) -> Vec<SummaryJob> {
        match &self.jobs {
            Some(jobs) => jobs.iter().map(JobConfig::to_job).collect(),
            None => default_jobs(),
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter, AppError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| AppError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use summary_engine::{GroupField, SummaryOrder};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.raw_dir, PathBuf::from("./raw"));
        assert_eq!(config.jobs().len(), 5);
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_configured_jobs_replace_defaults() {
        let json = r#"{
            "output_dir": "/tmp/out",
            "jobs": [
                { "name": "species", "kind": "yearly_counts",
                  "group_keys": ["taxagroup", "taxaname"],
                  "taxagroup_filter": ["Fish"] },
                { "name": "sites", "kind": "site_totals", "group_keys": ["taxagroup"] }
            ]
        }"#;
        let config = PipelineConfig::from_json(json).unwrap();
        let jobs = config.jobs();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "species");
        assert_eq!(jobs[0].definition.group_keys.fields(), &[GroupField::TaxaGroup, GroupField::TaxaName]);
        assert!(jobs[0].definition.taxagroup_filter.as_ref().unwrap().contains("fish"));
        assert_eq!(jobs[0].definition.order, SummaryOrder::Grouping);
        assert!(jobs[1].definition.enrich);
        assert!(!jobs[1].definition.by_year);
    }

    #[test]
    fn test_invalid_group_keys_rejected() {
        let json = r#"{ "jobs": [ { "name": "x", "kind": "site_totals", "group_keys": [] } ] }"#;
        assert!(PipelineConfig::from_json(json).is_err());

        let json = r#"{ "jobs": [ { "name": "x", "kind": "site_totals", "group_keys": ["year"] } ] }"#;
        assert!(PipelineConfig::from_json(json).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let config = PipelineConfig {
            log_level: "loud".to_string(),
            ..PipelineConfig::default()
        };
        assert!(matches!(config.level_filter(), Err(AppError::InvalidLogLevel(_))));
    }
}
