//! Histogram generation for Pix images

use super::{Pix, PixelDepth};
use crate::error::{Error, Result};
use crate::histogram::Histogram;

impl Pix {
    /// Get the grayscale histogram of an 8-bpp image (256 bins).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] for anything but 8 bpp.
    ///
    /// # Example
    ///
    /// ```
    /// use stainquant_core::{Pix, PixelDepth};
    ///
    /// let pix = Pix::new_filled(4, 4, PixelDepth::Bit8, 7).unwrap();
    /// let hist = pix.gray_histogram().unwrap();
    /// assert_eq!(hist.count(7), 16);
    /// ```
    pub fn gray_histogram(&self) -> Result<Histogram> {
        if self.depth() != PixelDepth::Bit8 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        let mut hist = Histogram::new(256);
        for y in 0..self.height() {
            for x in 0..self.width() {
                hist.increment(self.get_pixel_unchecked(x, y) as usize);
            }
        }
        Ok(hist)
    }
}
