//! Mask operations for 1 bpp images
//!
//! Counting, inversion and union of binary masks. Operations work on whole
//! 32-bit words; padding bits past the image width are kept at zero.

use super::{Pix, PixMut, PixelDepth};
use crate::error::{Error, Result};

impl Pix {
    /// Count the number of ON (foreground) pixels in a binary image.
    ///
    /// Returns 0 for images that are not 1 bpp.
    pub fn count_pixels(&self) -> u64 {
        if self.depth() != PixelDepth::Bit1 {
            return 0;
        }
        let tail = tail_mask(self.width());
        let wpl = self.wpl() as usize;
        let mut count = 0u64;
        for y in 0..self.height() {
            let line = self.row_data(y);
            for (i, &word) in line.iter().enumerate() {
                let w = if i + 1 == wpl { word & tail } else { word };
                count += u64::from(w.count_ones());
            }
        }
        count
    }

    /// Return a new 1 bpp mask with every pixel flipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] if the image is not 1 bpp.
    pub fn invert(&self) -> Result<Pix> {
        require_binary(self)?;
        let mut pm = self.to_mut();
        pm.invert_in_place();
        Ok(pm.into())
    }

    /// Return the union of two 1 bpp masks of equal size.
    ///
    /// # Errors
    ///
    /// Returns an error if either mask is not 1 bpp or their sizes differ.
    pub fn or(&self, other: &Pix) -> Result<Pix> {
        let mut pm = self.to_mut();
        pm.or_in_place(other)?;
        Ok(pm.into())
    }
}

impl PixMut {
    /// Flip every pixel of a 1 bpp mask in place. No-op for other depths.
    pub fn invert_in_place(&mut self) {
        if self.depth() != PixelDepth::Bit1 {
            return;
        }
        let tail = tail_mask(self.width());
        let wpl = self.wpl() as usize;
        for y in 0..self.height() {
            let line = self.row_data_mut(y);
            for (i, word) in line.iter_mut().enumerate() {
                *word = !*word;
                if i + 1 == wpl {
                    *word &= tail;
                }
            }
        }
    }

    /// OR a 1 bpp mask of the same size into this one.
    ///
    /// # Errors
    ///
    /// Returns an error if either mask is not 1 bpp or their sizes differ.
    pub fn or_in_place(&mut self, other: &Pix) -> Result<()> {
        if self.depth() != PixelDepth::Bit1 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        require_binary(other)?;
        if self.width() != other.width() || self.height() != other.height() {
            return Err(Error::DimensionMismatch {
                expected: (self.width(), self.height()),
                actual: (other.width(), other.height()),
            });
        }
        for (dst, src) in self.data_mut().iter_mut().zip(other.data()) {
            *dst |= *src;
        }
        Ok(())
    }
}

fn require_binary(pix: &Pix) -> Result<()> {
    if pix.depth() != PixelDepth::Bit1 {
        return Err(Error::UnsupportedDepth(pix.depth().bits()));
    }
    Ok(())
}

/// Mask of the valid bits in the last word of a 1 bpp row.
fn tail_mask(width: u32) -> u32 {
    match width % 32 {
        0 => u32::MAX,
        n => !(u32::MAX >> n),
    }
}
