//! Error types for metric evaluation and table I/O

use std::io;
use thiserror::Error;

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A metric table could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration or summary JSON was malformed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is outside the range the model accepts
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Simulation tables encode protocols as integers
    #[error("Unknown protocol code {0}")]
    UnknownProtocol(u8),

    /// The model has no finite answer for these parameters
    #[error("Degenerate model: {0}")]
    Degenerate(String),
}

impl AnalysisError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter { name, reason: reason.into() }
    }
}
