//! Error types for the stainquant batch pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failure while processing one image after it was decoded.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] stainquant_core::Error),

    /// Deconvolution or thresholding failed
    #[error("color error: {0}")]
    Color(#[from] stainquant_color::ColorError),

    /// Particle analysis failed
    #[error("region error: {0}")]
    Region(#[from] stainquant_region::RegionError),

    /// A derived result the next stage needs was not produced
    #[error("missing {0}")]
    Missing(&'static str),
}

/// Result type for per-image pipeline stages
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors of a batch run.
///
/// `Decode` and `Pipeline` concern a single image and never abort a batch;
/// the other variants are fatal.
#[derive(Debug, Error)]
pub enum StainError {
    /// Invalid configuration, raised before any image is processed
    #[error("configuration error: {0}")]
    Config(String),

    /// An image could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] stainquant_io::IoError),

    /// An image could not be processed
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// A report could not be built or written
    #[error("report error: {0}")]
    Report(#[from] stainquant_report::ReportError),

    /// A mask image could not be written
    #[error("cannot write mask {path}: {source}")]
    MaskWrite {
        path: PathBuf,
        source: stainquant_io::IoError,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StainError {
    /// True for errors confined to one image.
    pub fn is_per_item(&self) -> bool {
        matches!(self, StainError::Decode(_) | StainError::Pipeline(_))
    }
}

/// Result type for batch operations
pub type StainResult<T> = Result<T, StainError>;
