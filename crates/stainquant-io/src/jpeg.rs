//! JPEG image format support
//!
//! Reading only: grayscale JPEGs become 8 bpp (or 16 bpp for 16-bit
//! lossless files), RGB and CMYK JPEGs become 32 bpp RGB.

use crate::{IoError, IoResult};
use jpeg_decoder::{Decoder, PixelFormat};
use stainquant_core::{ImageFormat, Pix, PixelDepth, color};
use std::io::Read;

/// Read a JPEG image
pub fn read_jpeg<R: Read>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader);
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(format!("JPEG decode error: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("JPEG header missing after decode".to_string()))?;

    let width = u32::from(info.width);
    let height = u32::from(info.height);
    let (depth, bytes_per_pixel) = match info.pixel_format {
        PixelFormat::L8 => (PixelDepth::Bit8, 1),
        PixelFormat::L16 => (PixelDepth::Bit16, 2),
        PixelFormat::RGB24 => (PixelDepth::Bit32, 3),
        PixelFormat::CMYK32 => (PixelDepth::Bit32, 4),
        #[allow(unreachable_patterns)]
        other => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported JPEG pixel format: {:?}",
                other
            )));
        }
    };

    let needed = width as usize * height as usize * bytes_per_pixel;
    if pixels.len() < needed {
        return Err(IoError::InvalidData(format!(
            "JPEG produced {} bytes, expected {}",
            pixels.len(),
            needed
        )));
    }

    let mut pix_mut = Pix::new(width, height, depth)?.to_mut();
    pix_mut.set_informat(ImageFormat::Jpeg);

    for (i, px) in pixels[..needed].chunks_exact(bytes_per_pixel).enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let val = match px {
            [l] => *l as u32,
            [hi, lo] => ((*hi as u32) << 8) | *lo as u32,
            [r, g, b] => color::compose_rgb(*r, *g, *b),
            [c, m, ye, k] => {
                let (r, g, b) = cmyk_to_rgb(*c, *m, *ye, *k);
                color::compose_rgb(r, g, b)
            }
            _ => 0,
        };
        pix_mut.set_pixel_unchecked(x, y, val);
    }

    Ok(pix_mut.into())
}

/// Convert a CMYK sample to RGB.
fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> (u8, u8, u8) {
    let k = 255 - u16::from(k);
    let ch = |v: u8| (((255 - u16::from(v)) * k) / 255) as u8;
    (ch(c), ch(m), ch(y))
}
