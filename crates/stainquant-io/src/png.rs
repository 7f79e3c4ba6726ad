//! PNG image format support
//!
//! Decoding expands palettes to RGB, sub-byte grayscale to 8 bits and
//! transparency chunks to an alpha channel, so every PNG becomes an 8 bpp,
//! 16 bpp or 32 bpp `Pix`.

use crate::{IoError, IoResult};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use stainquant_core::{ImageFormat, Pix, PixelDepth, color};
use std::io::{BufRead, Seek, Write};

/// Read a PNG image
pub fn read_png<R: BufRead + Seek>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;

    let width = info.width;
    let height = info.height;
    let sixteen = info.bit_depth == BitDepth::Sixteen;

    let (pix_depth, spp, samples) = match (info.color_type, info.bit_depth) {
        (ColorType::Grayscale, BitDepth::Eight) => (PixelDepth::Bit8, 1, 1),
        (ColorType::Grayscale, BitDepth::Sixteen) => (PixelDepth::Bit16, 1, 1),
        (ColorType::GrayscaleAlpha, _) => (PixelDepth::Bit32, 2, 2),
        (ColorType::Rgb, _) => (PixelDepth::Bit32, 3, 3),
        (ColorType::Rgba, _) => (PixelDepth::Bit32, 4, 4),
        (color_type, bit_depth) => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported PNG format after expansion: {:?} {:?}",
                color_type, bit_depth
            )));
        }
    };
    let bytes_per_sample = if sixteen { 2 } else { 1 };

    let mut pix_mut = Pix::new(width, height, pix_depth)?.to_mut();
    pix_mut.set_spp(spp);
    pix_mut.set_informat(ImageFormat::Png);

    let bytes_per_row = info.line_size;
    let data = &buf[..info.buffer_size()];
    let needed = bytes_per_row * height as usize;
    if data.len() < needed {
        return Err(IoError::InvalidData(format!(
            "PNG frame holds {} bytes, expected {}",
            data.len(),
            needed
        )));
    }

    for y in 0..height {
        let row = &data[y as usize * bytes_per_row..][..bytes_per_row];
        for x in 0..width {
            let idx = x as usize * samples * bytes_per_sample;
            // High byte of a 16-bit sample, or the 8-bit sample itself
            let s = |i: usize| row[idx + i * bytes_per_sample];
            let val = match (info.color_type, samples) {
                (ColorType::Grayscale, _) if sixteen => {
                    ((row[idx] as u32) << 8) | row[idx + 1] as u32
                }
                (ColorType::Grayscale, _) => row[idx] as u32,
                (ColorType::GrayscaleAlpha, _) => color::compose_rgba(s(0), s(0), s(0), s(1)),
                (_, 3) => color::compose_rgb(s(0), s(1), s(2)),
                _ => color::compose_rgba(s(0), s(1), s(2), s(3)),
            };
            pix_mut.set_pixel_unchecked(x, y, val);
        }
    }

    Ok(pix_mut.into())
}

/// Write a PNG image
///
/// 1 bpp masks are written as 1-bit grayscale with ON pixels black, so a
/// mask file shows particles dark on a white background.
pub fn write_png<W: Write>(pix: &Pix, writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();

    let (color_type, bit_depth) = match pix.depth() {
        PixelDepth::Bit1 => (ColorType::Grayscale, BitDepth::One),
        PixelDepth::Bit8 => (ColorType::Grayscale, BitDepth::Eight),
        PixelDepth::Bit16 => (ColorType::Grayscale, BitDepth::Sixteen),
        PixelDepth::Bit32 => {
            if pix.spp() == 4 {
                (ColorType::Rgba, BitDepth::Eight)
            } else {
                (ColorType::Rgb, BitDepth::Eight)
            }
        }
    };

    let mut encoder = Encoder::new(writer, width, height);
    encoder.set_color(color_type);
    encoder.set_depth(bit_depth);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;

    let bytes_per_row = match (color_type, bit_depth) {
        (ColorType::Grayscale, BitDepth::One) => width.div_ceil(8),
        (ColorType::Grayscale, BitDepth::Sixteen) => width * 2,
        (ColorType::Grayscale, _) => width,
        (ColorType::Rgba, _) => width * 4,
        _ => width * 3,
    } as usize;

    let mut data = vec![0u8; bytes_per_row * height as usize];

    for y in 0..height {
        let row = &mut data[y as usize * bytes_per_row..][..bytes_per_row];
        for x in 0..width {
            let val = pix.get_pixel_unchecked(x, y);
            match pix.depth() {
                PixelDepth::Bit1 => {
                    if val == 0 {
                        row[(x / 8) as usize] |= 1 << (7 - (x % 8));
                    }
                }
                PixelDepth::Bit8 => row[x as usize] = val as u8,
                PixelDepth::Bit16 => {
                    let idx = x as usize * 2;
                    row[idx] = (val >> 8) as u8;
                    row[idx + 1] = val as u8;
                }
                PixelDepth::Bit32 => {
                    let (r, g, b) = color::extract_rgb(val);
                    if color_type == ColorType::Rgba {
                        let idx = x as usize * 4;
                        row[idx..idx + 4].copy_from_slice(&[r, g, b, val as u8]);
                    } else {
                        let idx = x as usize * 3;
                        row[idx..idx + 3].copy_from_slice(&[r, g, b]);
                    }
                }
            }
        }
    }

    writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_png_roundtrip_grayscale() {
        let pix = Pix::new(10, 10, PixelDepth::Bit8).unwrap();
        let mut pix_mut = pix.try_into_mut().unwrap();
        for y in 0..10 {
            for x in 0..10 {
                pix_mut.set_pixel(x, y, (x + y) * 10).unwrap();
            }
        }
        let pix: Pix = pix_mut.into();

        let mut buffer = Vec::new();
        write_png(&pix, &mut buffer).unwrap();
        let pix2 = read_png(Cursor::new(buffer)).unwrap();

        assert_eq!(pix2.depth(), PixelDepth::Bit8);
        assert_eq!(pix2.informat(), ImageFormat::Png);
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(pix2.get_pixel(x, y), pix.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_png_roundtrip_rgb() {
        let pix = Pix::new(5, 5, PixelDepth::Bit32).unwrap();
        let mut pix_mut = pix.try_into_mut().unwrap();
        pix_mut.set_rgb(0, 0, 255, 0, 0).unwrap();
        pix_mut.set_rgb(1, 1, 0, 255, 0).unwrap();
        pix_mut.set_rgb(2, 2, 0, 0, 255).unwrap();
        let pix: Pix = pix_mut.into();

        let mut buffer = Vec::new();
        write_png(&pix, &mut buffer).unwrap();
        let pix2 = read_png(Cursor::new(buffer)).unwrap();

        assert_eq!(pix2.spp(), 3);
        assert_eq!(pix2.get_rgb(0, 0), Some((255, 0, 0)));
        assert_eq!(pix2.get_rgb(1, 1), Some((0, 255, 0)));
        assert_eq!(pix2.get_rgb(2, 2), Some((0, 0, 255)));
        assert_eq!(pix2.get_rgb(3, 3), Some((0, 0, 0)));
    }

    #[test]
    fn test_png_mask_reads_back_as_black_on_white() {
        let pix = Pix::new(9, 2, PixelDepth::Bit1).unwrap();
        let mut pm = pix.try_into_mut().unwrap();
        pm.set_pixel(8, 1, 1).unwrap();
        let pix: Pix = pm.into();

        let mut buffer = Vec::new();
        write_png(&pix, &mut buffer).unwrap();
        let gray = read_png(Cursor::new(buffer)).unwrap();

        assert_eq!(gray.depth(), PixelDepth::Bit8);
        assert_eq!(gray.get_pixel(8, 1), Some(0));
        assert_eq!(gray.get_pixel(0, 0), Some(255));
    }

    #[test]
    fn test_png_roundtrip_16bit() {
        let pix = Pix::new_filled(3, 2, PixelDepth::Bit16, 0x1234).unwrap();
        let mut buffer = Vec::new();
        write_png(&pix, &mut buffer).unwrap();
        let pix2 = read_png(Cursor::new(buffer)).unwrap();
        assert_eq!(pix2.depth(), PixelDepth::Bit16);
        assert_eq!(pix2.get_pixel(2, 1), Some(0x1234));
    }

    #[test]
    fn test_png_garbage_is_decode_error() {
        let result = read_png(Cursor::new(vec![0x89, b'P', b'N', b'G', 0, 0]));
        assert!(matches!(result, Err(IoError::DecodeError(_))));
    }
}
