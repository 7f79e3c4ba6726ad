//! Channel thresholding
//!
//! Stain channels carry signal near 0, so a pixel is foreground when its
//! value is at or *below* the threshold. Channels are normalised to 8 bpp
//! before thresholding.

use crate::{ColorError, ColorResult};
use stainquant_core::{Pix, PixelDepth};

/// Normalise a channel to 8 bpp.
///
/// 8 bpp images are returned unchanged. 16 bpp images are stretched
/// linearly from their min..max range onto 0..255; a constant image maps
/// to 0.
pub fn to_8bit(pix: &Pix) -> ColorResult<Pix> {
    match pix.depth() {
        PixelDepth::Bit8 => Ok(pix.clone()),
        PixelDepth::Bit16 => Ok(pix.convert_16_to_8_stretched()?),
        other => Err(ColorError::UnsupportedDepth {
            expected: "8 or 16 bpp",
            actual: other.bits(),
        }),
    }
}

/// Threshold a channel into a 1 bpp mask: ON where `lo <= value <= hi`.
///
/// # Errors
///
/// Returns [`ColorError::InvalidParameters`] if `lo > hi`, or
/// [`ColorError::UnsupportedDepth`] for 1 bpp or 32 bpp input.
pub fn threshold_range(pix: &Pix, lo: u8, hi: u8) -> ColorResult<Pix> {
    if lo > hi {
        return Err(ColorError::InvalidParameters(format!(
            "threshold range is inverted: {} > {}",
            lo, hi
        )));
    }
    let pix8 = to_8bit(pix)?;
    let (lo, hi) = (u32::from(lo), u32::from(hi));

    let mut mask = Pix::new(pix8.width(), pix8.height(), PixelDepth::Bit1)?.to_mut();
    for y in 0..pix8.height() {
        for x in 0..pix8.width() {
            let v = pix8.get_pixel_unchecked(x, y);
            if v >= lo && v <= hi {
                mask.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(mask.into())
}

/// Threshold a channel with an inclusive upper bound: ON where `value <= t`.
pub fn threshold_upper(pix: &Pix, t: u8) -> ColorResult<Pix> {
    threshold_range(pix, 0, t)
}
