//! FILENAME: core/summary-engine/src/error.rs

use thiserror::Error;

/// Errors raised by the summary engine.
///
/// Data-quality gaps (missing metadata, unknown years) are not errors; they
/// are absorbed by the fill policy. Only a malformed summary configuration
/// fails a calculation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SummaryError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SummaryError::InvalidConfiguration(message.into())
    }
}
