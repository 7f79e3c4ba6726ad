//! Error types for stainquant-report

use thiserror::Error;

/// Errors that can occur while accumulating or writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] stainquant_core::Error),

    /// I/O error while writing the report
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row does not have the columns the report was created with
    #[error("row '{identifier}' does not match the report columns: {message}")]
    RowMismatch { identifier: String, message: String },
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;
