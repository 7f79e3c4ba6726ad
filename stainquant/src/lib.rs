//! stainquant - Stain quantification for histology micrographs
//!
//! Each image of a directory tree is unmixed into three stain channels,
//! thresholded, and analysed for particles; the per-image results are
//! aggregated into one CSV report per batch.
//!
//! # Overview
//!
//! - [`color`]: stain deconvolution and thresholding
//! - [`region`]: connected components and particle measurements
//! - [`report`]: area, histogram and particle tables
//! - [`io`]: image decoding and the directory walk
//! - [`BatchDriver`]: runs a validated [`AnalysisConfig`] end to end
//!
//! # Example
//!
//! ```no_run
//! use stainquant::{AnalysisConfig, BatchDriver, Mode};
//!
//! let config = AnalysisConfig::new(Mode::Area, "slides");
//! let summary = BatchDriver::new(config).unwrap().run().unwrap();
//! println!("{} images processed", summary.processed);
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;

// Re-export core types (primary data structures used everywhere)
pub use stainquant_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use stainquant_color as color;
pub use stainquant_io as io;
pub use stainquant_region as region;
pub use stainquant_report as report;

pub use batch::{BatchDriver, BatchSummary, MaskNames, preview_thresholds};
pub use config::{AnalysisConfig, Mode};
pub use error::{PipelineError, StainError, StainResult};
pub use pipeline::{AreaOutcome, Image, Pipeline, ThresholdMasks};
