//! Image statistics operations
//!
//! Intensity statistics (count, mean, standard deviation, min, max) of the
//! pixels of an image, optionally restricted to a 1 bpp mask. RGB pixels
//! are reduced to a gray value with a [`GrayWeighting`].

use super::{Pix, PixelDepth};
use crate::color::{self, GrayWeighting};
use crate::error::{Error, Result};

/// Summary of pixel intensities inside a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityStats {
    /// Number of pixels measured
    pub count: u64,
    /// Mean intensity
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator, 0 for a single pixel)
    pub std_dev: f64,
    /// Minimum intensity
    pub min: f64,
    /// Maximum intensity
    pub max: f64,
}

/// Running accumulator for [`IntensityStats`] (Welford's update).
#[derive(Debug, Clone, Copy, Default)]
pub struct IntensityAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl IntensityAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample.
    pub fn push(&mut self, v: f64) {
        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.count += 1;
        let delta = v - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v - self.mean);
    }

    /// Number of samples added so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Finish accumulation. Returns `None` if no sample was added.
    pub fn finish(&self) -> Option<IntensityStats> {
        if self.count == 0 {
            return None;
        }
        let std_dev = if self.count > 1 {
            (self.m2 / (self.count - 1) as f64).sqrt()
        } else {
            0.0
        };
        Some(IntensityStats {
            count: self.count,
            mean: self.mean,
            std_dev,
            min: self.min,
            max: self.max,
        })
    }
}

impl Pix {
    /// Intensity of the pixel at (x, y) as a real number.
    ///
    /// 8 and 16 bpp values are returned as-is; 32 bpp pixels are reduced
    /// with `weighting`. Returns `None` out of bounds or for 1 bpp images.
    pub fn intensity_at(&self, x: u32, y: u32, weighting: GrayWeighting) -> Option<f64> {
        let v = self.get_pixel(x, y)?;
        match self.depth() {
            PixelDepth::Bit1 => None,
            PixelDepth::Bit8 | PixelDepth::Bit16 => Some(f64::from(v)),
            PixelDepth::Bit32 => {
                let (r, g, b) = color::extract_rgb(v);
                Some(weighting.gray(r, g, b))
            }
        }
    }

    /// Intensity statistics over pixels where the 1 bpp `mask` is ON.
    ///
    /// Returns `Ok(None)` when the mask is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` is 1 bpp, `mask` is not 1 bpp, or their
    /// sizes differ.
    pub fn intensity_stats_masked(
        &self,
        mask: &Pix,
        weighting: GrayWeighting,
    ) -> Result<Option<IntensityStats>> {
        require_intensity(self)?;
        if mask.depth() != PixelDepth::Bit1 {
            return Err(Error::UnsupportedDepth(mask.depth().bits()));
        }
        self.check_same_size(mask)?;

        let mut acc = IntensityAccumulator::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                if mask.get_pixel_unchecked(x, y) == 0 {
                    continue;
                }
                if let Some(v) = self.intensity_at(x, y, weighting) {
                    acc.push(v);
                }
            }
        }
        Ok(acc.finish())
    }
}

fn require_intensity(pix: &Pix) -> Result<()> {
    if pix.depth() == PixelDepth::Bit1 {
        return Err(Error::UnsupportedDepth(1));
    }
    Ok(())
}
