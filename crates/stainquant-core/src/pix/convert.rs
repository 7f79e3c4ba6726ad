//! Depth conversion
//!
//! - Grayscale (8/16 bpp) to 32 bpp RGB, replicating the gray value
//! - 16 bpp to 8 bpp, either by high byte or by linear min..max stretch

use super::{Pix, PixelDepth};
use crate::color;
use crate::error::{Error, Result};

impl Pix {
    /// Convert to 32 bpp RGB.
    ///
    /// 8 bpp values are replicated into R, G and B; 16 bpp values use their
    /// high byte. 32 bpp images are returned as a cheap clone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] for 1 bpp images.
    pub fn convert_to_rgb(&self) -> Result<Pix> {
        match self.depth() {
            PixelDepth::Bit32 => return Ok(self.clone()),
            PixelDepth::Bit16 => return self.convert_16_to_8_high_byte()?.convert_to_rgb(),
            PixelDepth::Bit1 => return Err(Error::UnsupportedDepth(1)),
            PixelDepth::Bit8 => {}
        }
        let mut pm = Pix::new(self.width(), self.height(), PixelDepth::Bit32)?.to_mut();
        pm.set_informat(self.informat());
        pm.set_text(self.text().map(str::to_string));
        for y in 0..self.height() {
            for x in 0..self.width() {
                let g = self.get_pixel_unchecked(x, y) as u8;
                pm.set_pixel_unchecked(x, y, color::compose_rgb(g, g, g));
            }
        }
        Ok(pm.into())
    }

    /// Minimum and maximum pixel values of a 1/8/16 bpp image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] for 32 bpp images.
    pub fn min_max(&self) -> Result<(u32, u32)> {
        if self.depth() == PixelDepth::Bit32 {
            return Err(Error::UnsupportedDepth(32));
        }
        let mut min = u32::MAX;
        let mut max = 0u32;
        for y in 0..self.height() {
            for x in 0..self.width() {
                let v = self.get_pixel_unchecked(x, y);
                min = min.min(v);
                max = max.max(v);
            }
        }
        Ok((min, max))
    }

    /// Convert a 16 bpp image to 8 bpp by stretching its `[min, max]` range
    /// linearly onto `[0, 255]`.
    ///
    /// A constant image maps to all zeros.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] if the image is not 16 bpp.
    pub fn convert_16_to_8_stretched(&self) -> Result<Pix> {
        if self.depth() != PixelDepth::Bit16 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        let (min, max) = self.min_max()?;
        let range = f64::from(max - min);
        self.map_to_8(|v| {
            if range == 0.0 {
                0
            } else {
                (f64::from(v - min) * 255.0 / range).round() as u32
            }
        })
    }

    /// Convert a 16 bpp image to 8 bpp by keeping the high byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] if the image is not 16 bpp.
    pub fn convert_16_to_8_high_byte(&self) -> Result<Pix> {
        if self.depth() != PixelDepth::Bit16 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        self.map_to_8(|v| v >> 8)
    }

    fn map_to_8(&self, f: impl Fn(u32) -> u32) -> Result<Pix> {
        let mut pm = Pix::new(self.width(), self.height(), PixelDepth::Bit8)?.to_mut();
        pm.set_informat(self.informat());
        pm.set_text(self.text().map(str::to_string));
        for y in 0..self.height() {
            for x in 0..self.width() {
                pm.set_pixel_unchecked(x, y, f(self.get_pixel_unchecked(x, y)).min(255));
            }
        }
        Ok(pm.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray8_to_rgb() {
        let pix = Pix::new_filled(2, 2, PixelDepth::Bit8, 90).unwrap();
        let rgb = pix.convert_to_rgb().unwrap();
        assert_eq!(rgb.depth(), PixelDepth::Bit32);
        assert_eq!(rgb.get_rgb(1, 1), Some((90, 90, 90)));
    }

    #[test]
    fn test_gray16_to_rgb_high_byte() {
        let pix = Pix::new_filled(1, 1, PixelDepth::Bit16, 0xab12).unwrap();
        let rgb = pix.convert_to_rgb().unwrap();
        assert_eq!(rgb.get_rgb(0, 0), Some((0xab, 0xab, 0xab)));
    }

    #[test]
    fn test_binary_to_rgb_rejected() {
        let pix = Pix::new(1, 1, PixelDepth::Bit1).unwrap();
        assert!(pix.convert_to_rgb().is_err());
    }

    #[test]
    fn test_stretch_16_to_8() {
        let mut pm = Pix::new(3, 1, PixelDepth::Bit16).unwrap().to_mut();
        pm.set_pixel(0, 0, 1000).unwrap();
        pm.set_pixel(1, 0, 1500).unwrap();
        pm.set_pixel(2, 0, 2000).unwrap();
        let pix: Pix = pm.into();
        let out = pix.convert_16_to_8_stretched().unwrap();
        assert_eq!(out.get_pixel(0, 0), Some(0));
        assert_eq!(out.get_pixel(1, 0), Some(128));
        assert_eq!(out.get_pixel(2, 0), Some(255));
    }

    #[test]
    fn test_stretch_constant_is_zero() {
        let pix = Pix::new_filled(2, 2, PixelDepth::Bit16, 4000).unwrap();
        let out = pix.convert_16_to_8_stretched().unwrap();
        assert_eq!(out.get_pixel(1, 1), Some(0));
    }

    #[test]
    fn test_high_byte() {
        let pix = Pix::new_filled(1, 1, PixelDepth::Bit16, 0x7f80).unwrap();
        let out = pix.convert_16_to_8_high_byte().unwrap();
        assert_eq!(out.get_pixel(0, 0), Some(0x7f));
    }
}
