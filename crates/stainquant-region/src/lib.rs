//! stainquant-region - Particle analysis for stainquant
//!
//! This crate turns binary masks into measured particles:
//!
//! - **Connected component labelling** - 4- or 8-connected, scan-ordered labels
//! - **Outline tracing** - crack-following outline, corrected perimeter, circularity
//! - **Particle analysis** - size/circularity filters, intensity sampling, union mask
//!
//! # Examples
//!
//! ```
//! use stainquant_region::{ParticleOptions, analyze_particles};
//! use stainquant_core::{Pix, PixelDepth};
//!
//! let mut pm = Pix::new(10, 10, PixelDepth::Bit1).unwrap().to_mut();
//! for (x, y) in [(4, 4), (5, 4), (4, 5), (5, 5)] {
//!     pm.set_pixel(x, y, 1).unwrap();
//! }
//! let mask: Pix = pm.into();
//!
//! let analysis = analyze_particles(&mask, None, &ParticleOptions::default()).unwrap();
//! assert_eq!(analysis.count(), 1);
//! assert_eq!(analysis.total_scaled_area(2.0), 16.0);
//! ```

pub mod conncomp;
pub mod contour;
pub mod error;
pub mod particle;

// Re-export core types
pub use stainquant_core;

pub use error::{RegionError, RegionResult};

pub use conncomp::{Component, Connectivity, LabelMap, label_components};
pub use contour::{circularity, trace_outline, traced_perimeter};
pub use particle::{Particle, ParticleAnalysis, ParticleOptions, analyze_particles};
