//! FILENAME: app/src/error.rs

use std::path::PathBuf;

use persistence::PersistenceError;
use summary_engine::PipelineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown log level: {0}")]
    InvalidLogLevel(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
