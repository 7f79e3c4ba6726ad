//! stainquant-color - Stain separation and masking
//!
//! - **Deconvolution** ([`deconvolve`]): unmix RGB into three stain channels
//!   with a fixed [`StainMatrix`]
//! - **Thresholding** ([`threshold`]): 8-bit normalisation and upper-bound
//!   masks ("lower values = stained")

pub mod deconvolve;
pub mod error;
pub mod threshold;

// Re-export core types
pub use stainquant_core;

pub use error::{ColorError, ColorResult};

pub use deconvolve::{Deconvolver, StainMatrix, deconvolve};
pub use threshold::{threshold_range, threshold_upper, to_8bit};
