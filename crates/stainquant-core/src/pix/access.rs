//! Pixel access functions
//!
//! Low-level functions for getting and setting individual pixels.
//!
//! # Pixel packing
//!
//! Pixels are packed MSB-to-LSB within each 32-bit word. For example,
//! in a 1-bit image, pixel 0 occupies bit 31 (MSB) of the first word.

use super::{Pix, PixMut, PixelDepth};
use crate::color;
use crate::error::{Error, Result};

impl Pix {
    /// Get a pixel value at (x, y).
    ///
    /// Returns `None` if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.get_pixel_unchecked(x, y))
    }

    /// Get a pixel value without bounds checking.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height` or `x` lies beyond the row's words.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u32 {
        get_pixel_from_line(self.row_data(y), x, self.depth())
    }

    /// Get RGB values at (x, y).
    ///
    /// Only valid for 32-bit images.
    pub fn get_rgb(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if self.depth() != PixelDepth::Bit32 {
            return None;
        }
        self.get_pixel(x, y).map(color::extract_rgb)
    }
}

impl PixMut {
    /// Get a pixel value at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.get_pixel_unchecked(x, y))
    }

    /// Get a pixel value without bounds checking.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u32 {
        get_pixel_from_line(self.row_data(y), x, self.depth())
    }

    /// Set a pixel value at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, val: u32) -> Result<()> {
        if x >= self.width() {
            return Err(Error::IndexOutOfBounds {
                index: x as usize,
                len: self.width() as usize,
            });
        }
        if y >= self.height() {
            return Err(Error::IndexOutOfBounds {
                index: y as usize,
                len: self.height() as usize,
            });
        }
        self.set_pixel_unchecked(x, y, val);
        Ok(())
    }

    /// Set a pixel value without bounds checking.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height` or `x` lies beyond the row's words.
    #[inline]
    pub fn set_pixel_unchecked(&mut self, x: u32, y: u32, val: u32) {
        let depth = self.depth();
        set_pixel_in_line(self.row_data_mut(y), x, depth, val);
    }

    /// Set an RGB pixel at (x, y).
    ///
    /// Only valid for 32-bit images.
    pub fn set_rgb(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8) -> Result<()> {
        if self.depth() != PixelDepth::Bit32 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        self.set_pixel(x, y, color::compose_rgb(r, g, b))
    }
}

/// Get a pixel from a row of packed words.
#[inline]
pub fn get_pixel_from_line(line: &[u32], x: u32, depth: PixelDepth) -> u32 {
    match depth {
        PixelDepth::Bit1 => get_data_bit(line, x),
        PixelDepth::Bit8 => get_data_byte(line, x),
        PixelDepth::Bit16 => get_data_two_bytes(line, x),
        PixelDepth::Bit32 => line[x as usize],
    }
}

/// Set a pixel in a row of packed words. The value is masked to the depth.
#[inline]
pub fn set_pixel_in_line(line: &mut [u32], x: u32, depth: PixelDepth, val: u32) {
    match depth {
        PixelDepth::Bit1 => set_data_bit(line, x, val),
        PixelDepth::Bit8 => set_data_byte(line, x, val),
        PixelDepth::Bit16 => set_data_two_bytes(line, x, val),
        PixelDepth::Bit32 => line[x as usize] = val,
    }
}

/// Get a 1-bit pixel value.
#[inline]
pub fn get_data_bit(line: &[u32], x: u32) -> u32 {
    (line[(x >> 5) as usize] >> (31 - (x & 31))) & 1
}

/// Set a 1-bit pixel value.
#[inline]
pub fn set_data_bit(line: &mut [u32], x: u32, val: u32) {
    let word = &mut line[(x >> 5) as usize];
    let shift = 31 - (x & 31);
    *word = (*word & !(1 << shift)) | ((val & 1) << shift);
}

/// Get an 8-bit pixel value.
#[inline]
pub fn get_data_byte(line: &[u32], x: u32) -> u32 {
    (line[(x >> 2) as usize] >> (24 - 8 * (x & 3))) & 0xff
}

/// Set an 8-bit pixel value.
#[inline]
pub fn set_data_byte(line: &mut [u32], x: u32, val: u32) {
    let word = &mut line[(x >> 2) as usize];
    let shift = 24 - 8 * (x & 3);
    *word = (*word & !(0xff << shift)) | ((val & 0xff) << shift);
}

/// Get a 16-bit pixel value.
#[inline]
pub fn get_data_two_bytes(line: &[u32], x: u32) -> u32 {
    (line[(x >> 1) as usize] >> (16 - 16 * (x & 1))) & 0xffff
}

/// Set a 16-bit pixel value.
#[inline]
pub fn set_data_two_bytes(line: &mut [u32], x: u32, val: u32) {
    let word = &mut line[(x >> 1) as usize];
    let shift = 16 - 16 * (x & 1);
    *word = (*word & !(0xffff << shift)) | ((val & 0xffff) << shift);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_packing_msb_first() {
        let mut line = [0u32; 2];
        set_data_bit(&mut line, 0, 1);
        set_data_bit(&mut line, 33, 1);
        assert_eq!(line[0], 0x8000_0000);
        assert_eq!(line[1], 0x4000_0000);
        assert_eq!(get_data_bit(&line, 0), 1);
        assert_eq!(get_data_bit(&line, 1), 0);
        set_data_bit(&mut line, 0, 0);
        assert_eq!(line[0], 0);
    }

    #[test]
    fn test_byte_packing() {
        let mut line = [0u32; 1];
        set_data_byte(&mut line, 0, 0x12);
        set_data_byte(&mut line, 3, 0x34);
        assert_eq!(line[0], 0x1200_0034);
        assert_eq!(get_data_byte(&line, 3), 0x34);
        set_data_byte(&mut line, 0, 0x1ff);
        assert_eq!(get_data_byte(&line, 0), 0xff);
    }

    #[test]
    fn test_two_byte_packing() {
        let mut line = [0u32; 1];
        set_data_two_bytes(&mut line, 1, 0xbeef);
        assert_eq!(line[0], 0x0000_beef);
        assert_eq!(get_data_two_bytes(&line, 1), 0xbeef);
        assert_eq!(get_data_two_bytes(&line, 0), 0);
    }

    #[test]
    fn test_set_get_pixel_bounds() {
        let pix = Pix::new(5, 3, PixelDepth::Bit8).unwrap();
        let mut pm = pix.try_into_mut().unwrap();
        pm.set_pixel(4, 2, 77).unwrap();
        assert!(pm.set_pixel(5, 0, 1).is_err());
        assert!(pm.set_pixel(0, 3, 1).is_err());
        let pix: Pix = pm.into();
        assert_eq!(pix.get_pixel(4, 2), Some(77));
        assert_eq!(pix.get_pixel(5, 2), None);
    }

    #[test]
    fn test_rgb_access() {
        let pix = Pix::new(2, 2, PixelDepth::Bit32).unwrap();
        let mut pm = pix.try_into_mut().unwrap();
        pm.set_rgb(1, 1, 10, 20, 30).unwrap();
        let pix: Pix = pm.into();
        assert_eq!(pix.get_rgb(1, 1), Some((10, 20, 30)));

        let gray = Pix::new(2, 2, PixelDepth::Bit8).unwrap();
        assert_eq!(gray.get_rgb(0, 0), None);
        let mut gm = gray.to_mut();
        assert!(gm.set_rgb(0, 0, 1, 2, 3).is_err());
    }
}
