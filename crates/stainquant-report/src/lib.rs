//! stainquant-report - Batch aggregation and report tables
//!
//! Every report follows the same contract ([`Reporter`]): rows are
//! appended once per image in processing order, and the finished table is
//! written once at the end of the batch. An empty report writes nothing.
//!
//! - [`AreaReport`] - particle counts, areas and mask statistics per image
//! - [`HistogramReport`] - first-channel intensity histograms per image
//! - [`ParticleReport`] - one line per accepted particle
//!
//! # Examples
//!
//! ```
//! use stainquant_report::{HistogramRecord, HistogramReport, Reporter};
//! use stainquant_core::Histogram;
//!
//! let mut report = HistogramReport::new();
//! let mut h = Histogram::new(256);
//! h.increment(40);
//! report
//!     .append(HistogramRecord {
//!         identifier: "slide1.tif".to_string(),
//!         channels: vec![h],
//!     })
//!     .unwrap();
//! assert!(report.render().starts_with("Intensity,Count_slide1.tif\n"));
//! ```

pub mod area;
pub mod csv;
pub mod error;
pub mod histogram;
pub mod particles;
pub mod reporter;

// Re-export core types
pub use stainquant_core;

pub use error::{ReportError, ReportResult};

pub use area::{AreaReport, BackgroundArea, ImageResult};
pub use histogram::{HistogramRecord, HistogramReport, MAX_INTENSITY};
pub use particles::{ParticleReport, ParticleRow};
pub use reporter::Reporter;
