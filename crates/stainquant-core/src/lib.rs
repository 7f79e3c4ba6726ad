//! stainquant-core - Basic raster types for stain quantification
//!
//! This crate provides the data structures shared by every stage of the
//! stainquant pipeline:
//!
//! - [`Pix`] / [`PixMut`] - The raster container (immutable / mutable)
//! - [`Box`] - Rectangle regions (particle bounds)
//! - [`Histogram`] / [`HistogramStats`] - Intensity histograms and their summary
//! - [`IntensityStats`] - Mean/stddev/min/max of pixel values in a region
//! - [`color`] - Packing helpers for 32-bit RGB pixels and gray conversion

pub mod box_;
pub mod error;
pub mod histogram;
pub mod pix;

pub use box_::Box;
pub use error::{Error, Result};
pub use histogram::{Histogram, HistogramStats};
pub use pix::statistics::IntensityStats;
pub use pix::{ImageFormat, Pix, PixMut, PixelDepth};

/// Color channel helpers for 32-bit RGBA pixels.
///
/// # Pixel format
///
/// 32-bit pixels are stored as `0xRRGGBBAA` (red in MSB, alpha in LSB).
pub mod color {
    /// Shift amounts for extracting color channels
    pub const RED_SHIFT: u32 = 24;
    pub const GREEN_SHIFT: u32 = 16;
    pub const BLUE_SHIFT: u32 = 8;
    pub const ALPHA_SHIFT: u32 = 0;

    /// Extract red component from a 32-bit pixel.
    #[inline]
    pub fn red(pixel: u32) -> u8 {
        ((pixel >> RED_SHIFT) & 0xff) as u8
    }

    /// Extract green component from a 32-bit pixel.
    #[inline]
    pub fn green(pixel: u32) -> u8 {
        ((pixel >> GREEN_SHIFT) & 0xff) as u8
    }

    /// Extract blue component from a 32-bit pixel.
    #[inline]
    pub fn blue(pixel: u32) -> u8 {
        ((pixel >> BLUE_SHIFT) & 0xff) as u8
    }

    /// Compose a 32-bit RGB pixel (alpha = 255).
    #[inline]
    pub fn compose_rgb(r: u8, g: u8, b: u8) -> u32 {
        ((r as u32) << RED_SHIFT)
            | ((g as u32) << GREEN_SHIFT)
            | ((b as u32) << BLUE_SHIFT)
            | (255 << ALPHA_SHIFT)
    }

    /// Compose a 32-bit RGBA pixel.
    #[inline]
    pub fn compose_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
        ((r as u32) << RED_SHIFT)
            | ((g as u32) << GREEN_SHIFT)
            | ((b as u32) << BLUE_SHIFT)
            | ((a as u32) << ALPHA_SHIFT)
    }

    /// Extract RGB values from a 32-bit pixel.
    #[inline]
    pub fn extract_rgb(pixel: u32) -> (u8, u8, u8) {
        (red(pixel), green(pixel), blue(pixel))
    }

    /// How an RGB pixel is reduced to a single intensity for statistics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum GrayWeighting {
        /// `(r + g + b) / 3`
        #[default]
        Unweighted,
        /// `0.299 r + 0.587 g + 0.114 b`
        Weighted,
    }

    impl GrayWeighting {
        /// Gray value of an RGB triplet as a real number.
        #[inline]
        pub fn gray(self, r: u8, g: u8, b: u8) -> f64 {
            match self {
                GrayWeighting::Unweighted => (r as f64 + g as f64 + b as f64) / 3.0,
                GrayWeighting::Weighted => 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_compose_extract_roundtrip() {
            let pixel = compose_rgb(12, 200, 77);
            assert_eq!(extract_rgb(pixel), (12, 200, 77));
            assert_eq!(pixel & 0xff, 255);
        }

        #[test]
        fn test_compose_rgba_keeps_alpha() {
            let pixel = compose_rgba(1, 2, 3, 4);
            assert_eq!(pixel, 0x01020304);
        }

        #[test]
        fn test_gray_unweighted() {
            assert_eq!(GrayWeighting::Unweighted.gray(30, 60, 90), 60.0);
        }

        #[test]
        fn test_gray_weighted_white() {
            let g = GrayWeighting::Weighted.gray(255, 255, 255);
            assert!((g - 255.0).abs() < 1e-9);
        }
    }
}
