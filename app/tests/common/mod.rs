//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use app_lib::PipelineConfig;
use tempfile::TempDir;

/// A scratch directory laid out like a survey project:
/// `raw/` for survey files, `data/` for metadata and outputs.
pub struct TestHarness {
    pub dir: TempDir,
}

impl TestHarness {
    /// Create a harness with empty `raw/` and `data/` directories.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("raw")).unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        TestHarness { dir }
    }

    /// Create a harness with two taxa groups and their metadata.
    pub fn with_sample_data() -> Self {
        let harness = Self::new();
        harness.write_survey(
            "fish.csv",
            "siteid,datecollected,taxaname\n\
             1,2019-05-01,Chromis\n\
             1,2019-06-01T08:30:00,Chromis\n\
             1,01/10/2020,Chromis\n\
             2,2020-02-02,Pomacentrus\n",
        );
        harness.write_survey(
            "water.csv",
            "siteid,datecollected\n\
             1,2019-01-01\n\
             2,not recorded\n",
        );
        harness.write_metadata(
            "siteid,taxagroup,sitename,decimallatitude,decimallongitude,startyearcollected,endyearcollected\n\
             1,Fish,Reef A,-16.5,145.5,2010.0,2020.0\n\
             2,fish,Reef B,-17.0,146.0,2015,2020\n\
             1,water,Reef A,-16.5,145.5,2012,2019\n",
        );
        harness
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.dir.path().join("raw")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn write_survey(&self, name: &str, body: &str) {
        fs::write(self.raw_dir().join(name), body).unwrap();
    }

    pub fn write_metadata(&self, body: &str) {
        fs::write(self.data_dir().join("metadata.csv"), body).unwrap();
    }

    /// Writes a JSON config file and returns its path.
    pub fn write_config(&self, json: &str) -> PathBuf {
        let path = self.dir.path().join("config.json");
        fs::write(&path, json).unwrap();
        path
    }

    /// Config pointing at this harness's directories.
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            raw_dir: self.raw_dir(),
            metadata_path: self.data_dir().join("metadata.csv"),
            output_dir: self.data_dir(),
            ..PipelineConfig::default()
        }
    }

    /// Lines of an output file written by a job.
    pub fn output_lines(&self, job: &str) -> Vec<String> {
        fs::read_to_string(self.data_dir().join(format!("{}.csv", job)))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
