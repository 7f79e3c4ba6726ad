//! TIFF image format support
//!
//! Only the first page of a multi-page file is read. Gray 1-bit pages are
//! expanded to 8 bpp; 16-bit RGB samples keep their high byte; half and
//! single precision float gray pages are stretched to 8 bpp.

use crate::{IoError, IoResult};
use stainquant_core::{ImageFormat, Pix, PixMut, PixelDepth, color};
use std::io::{Read, Seek, Write};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::{Gray8, RGB8};
use tiff::tags::Tag;

/// PhotometricInterpretation value for "0 is white"
const WHITE_IS_ZERO: u32 = 0;

/// Read the first page of a TIFF image
pub fn read_tiff<R: Read + Seek>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader)
        .map_err(|e| IoError::DecodeError(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| IoError::DecodeError(format!("Failed to get TIFF dimensions: {}", e)))?;
    let color_type = decoder
        .colortype()
        .map_err(|e| IoError::DecodeError(format!("Failed to get TIFF color type: {}", e)))?;
    let white_is_zero = decoder
        .get_tag_u32(Tag::PhotometricInterpretation)
        .is_ok_and(|v| v == WHITE_IS_ZERO);

    let (depth, spp) = match color_type {
        ColorType::Gray(1) | ColorType::Gray(8) => (PixelDepth::Bit8, 1),
        ColorType::Gray(16) => (PixelDepth::Bit16, 1),
        ColorType::Gray(32) | ColorType::Gray(64) => (PixelDepth::Bit8, 1),
        ColorType::GrayA(8) | ColorType::GrayA(16) => (PixelDepth::Bit32, 2),
        ColorType::RGB(8) | ColorType::RGB(16) => (PixelDepth::Bit32, 3),
        ColorType::RGBA(8) | ColorType::RGBA(16) => (PixelDepth::Bit32, 4),
        _ => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported TIFF color type: {:?}",
                color_type
            )));
        }
    };

    let image_data = decoder
        .read_image()
        .map_err(|e| IoError::DecodeError(format!("Failed to read TIFF image data: {}", e)))?;

    let mut pix_mut = Pix::new(width, height, depth)?.to_mut();
    pix_mut.set_spp(spp);
    pix_mut.set_informat(ImageFormat::Tiff);

    match image_data {
        DecodingResult::U8(data) => convert_u8(&data, &mut pix_mut, color_type, white_is_zero)?,
        DecodingResult::U16(data) => convert_u16(&data, &mut pix_mut, color_type, white_is_zero)?,
        DecodingResult::F16(data) => {
            let values: Vec<f64> = data.iter().map(|v: &half::f16| f64::from(v.to_f32())).collect();
            convert_float(&values, &mut pix_mut)?
        }
        DecodingResult::F32(data) => {
            let values: Vec<f64> = data.iter().map(|&v| f64::from(v)).collect();
            convert_float(&values, &mut pix_mut)?
        }
        DecodingResult::F64(data) => convert_float(&data, &mut pix_mut)?,
        _ => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported TIFF sample format for {:?}",
                color_type
            )));
        }
    }

    Ok(pix_mut.into())
}

fn check_len(len: usize, needed: usize) -> IoResult<()> {
    if len < needed {
        return Err(IoError::InvalidData(format!(
            "TIFF strip data holds {} samples, expected {}",
            len, needed
        )));
    }
    Ok(())
}

fn convert_u8(
    data: &[u8],
    pix_mut: &mut PixMut,
    color_type: ColorType,
    white_is_zero: bool,
) -> IoResult<()> {
    let width = pix_mut.width() as usize;
    let height = pix_mut.height() as usize;
    let gray = |v: u8| if white_is_zero { 255 - v } else { v };

    match color_type {
        ColorType::Gray(1) => {
            // Packed 8 pixels per byte, rows padded to whole bytes
            let bytes_per_row = width.div_ceil(8);
            check_len(data.len(), bytes_per_row * height)?;
            for y in 0..height {
                for x in 0..width {
                    let bit = (data[y * bytes_per_row + x / 8] >> (7 - (x % 8))) & 1;
                    let v = gray(if bit == 1 { 255 } else { 0 });
                    pix_mut.set_pixel_unchecked(x as u32, y as u32, v as u32);
                }
            }
        }
        ColorType::Gray(8) => {
            check_len(data.len(), width * height)?;
            for y in 0..height {
                for x in 0..width {
                    let v = gray(data[y * width + x]);
                    pix_mut.set_pixel_unchecked(x as u32, y as u32, v as u32);
                }
            }
        }
        ColorType::GrayA(8) | ColorType::RGB(8) | ColorType::RGBA(8) => {
            let samples = match color_type {
                ColorType::GrayA(_) => 2,
                ColorType::RGB(_) => 3,
                _ => 4,
            };
            check_len(data.len(), width * height * samples)?;
            for y in 0..height {
                for x in 0..width {
                    let px = &data[(y * width + x) * samples..][..samples];
                    let val = match px {
                        [g, a] => color::compose_rgba(*g, *g, *g, *a),
                        [r, g, b] => color::compose_rgb(*r, *g, *b),
                        [r, g, b, a] => color::compose_rgba(*r, *g, *b, *a),
                        _ => 0,
                    };
                    pix_mut.set_pixel_unchecked(x as u32, y as u32, val);
                }
            }
        }
        _ => {
            return Err(IoError::UnsupportedFormat(format!(
                "unexpected 8-bit TIFF color type: {:?}",
                color_type
            )));
        }
    }
    Ok(())
}

fn convert_u16(
    data: &[u16],
    pix_mut: &mut PixMut,
    color_type: ColorType,
    white_is_zero: bool,
) -> IoResult<()> {
    let width = pix_mut.width() as usize;
    let height = pix_mut.height() as usize;
    let hi = |v: u16| (v >> 8) as u8;

    match color_type {
        ColorType::Gray(16) => {
            check_len(data.len(), width * height)?;
            for y in 0..height {
                for x in 0..width {
                    let v = data[y * width + x];
                    let v = if white_is_zero { u16::MAX - v } else { v };
                    pix_mut.set_pixel_unchecked(x as u32, y as u32, v as u32);
                }
            }
        }
        ColorType::GrayA(16) | ColorType::RGB(16) | ColorType::RGBA(16) => {
            let samples = match color_type {
                ColorType::GrayA(_) => 2,
                ColorType::RGB(_) => 3,
                _ => 4,
            };
            check_len(data.len(), width * height * samples)?;
            for y in 0..height {
                for x in 0..width {
                    let px = &data[(y * width + x) * samples..][..samples];
                    let val = match px {
                        [g, a] => color::compose_rgba(hi(*g), hi(*g), hi(*g), hi(*a)),
                        [r, g, b] => color::compose_rgb(hi(*r), hi(*g), hi(*b)),
                        [r, g, b, a] => color::compose_rgba(hi(*r), hi(*g), hi(*b), hi(*a)),
                        _ => 0,
                    };
                    pix_mut.set_pixel_unchecked(x as u32, y as u32, val);
                }
            }
        }
        _ => {
            return Err(IoError::UnsupportedFormat(format!(
                "unexpected 16-bit TIFF color type: {:?}",
                color_type
            )));
        }
    }
    Ok(())
}

/// Stretch float gray samples from their min..max range onto 0..255.
fn convert_float(data: &[f64], pix_mut: &mut PixMut) -> IoResult<()> {
    let width = pix_mut.width() as usize;
    let height = pix_mut.height() as usize;
    check_len(data.len(), width * height)?;

    let finite = data.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let range = if max > min { max - min } else { 1.0 };

    for y in 0..height {
        for x in 0..width {
            let v = data[y * width + x];
            let scaled = if v.is_finite() {
                ((v - min) / range * 255.0).round().clamp(0.0, 255.0) as u32
            } else {
                0
            };
            pix_mut.set_pixel_unchecked(x as u32, y as u32, scaled);
        }
    }
    Ok(())
}

/// Write an uncompressed single-page TIFF.
///
/// 8 bpp images are written as 8-bit gray, 32 bpp images as 8-bit RGB and
/// 1 bpp masks as 8-bit gray with ON pixels black.
pub fn write_tiff<W: Write + Seek>(pix: &Pix, writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| IoError::EncodeError(format!("TIFF encoder error: {}", e)))?;

    match pix.depth() {
        PixelDepth::Bit1 | PixelDepth::Bit8 => {
            let mut data = Vec::with_capacity((width * height) as usize);
            for y in 0..height {
                for x in 0..width {
                    let v = pix.get_pixel_unchecked(x, y);
                    data.push(match pix.depth() {
                        PixelDepth::Bit1 => {
                            if v != 0 {
                                0
                            } else {
                                255
                            }
                        }
                        _ => v as u8,
                    });
                }
            }
            encoder
                .write_image::<Gray8>(width, height, &data)
                .map_err(|e| IoError::EncodeError(format!("TIFF write error: {}", e)))?;
        }
        PixelDepth::Bit32 => {
            let mut data = Vec::with_capacity((width * height * 3) as usize);
            for y in 0..height {
                for x in 0..width {
                    let (r, g, b) = color::extract_rgb(pix.get_pixel_unchecked(x, y));
                    data.extend_from_slice(&[r, g, b]);
                }
            }
            encoder
                .write_image::<RGB8>(width, height, &data)
                .map_err(|e| IoError::EncodeError(format!("TIFF write error: {}", e)))?;
        }
        PixelDepth::Bit16 => {
            return Err(IoError::UnsupportedFormat(
                "16 bpp TIFF output is not supported".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_tiff_roundtrip_rgb() {
        let pix = Pix::new(6, 4, PixelDepth::Bit32).unwrap();
        let mut pm = pix.try_into_mut().unwrap();
        pm.set_rgb(5, 3, 200, 100, 50).unwrap();
        let pix: Pix = pm.into();

        let mut buf = Cursor::new(Vec::new());
        write_tiff(&pix, &mut buf).unwrap();
        let back = read_tiff(Cursor::new(buf.into_inner())).unwrap();

        assert_eq!(back.depth(), PixelDepth::Bit32);
        assert_eq!(back.informat(), ImageFormat::Tiff);
        assert_eq!(back.get_rgb(5, 3), Some((200, 100, 50)));
        assert_eq!(back.get_rgb(0, 0), Some((0, 0, 0)));
    }

    #[test]
    fn test_tiff_roundtrip_gray() {
        let pix = Pix::new_filled(3, 3, PixelDepth::Bit8, 77).unwrap();
        let mut buf = Cursor::new(Vec::new());
        write_tiff(&pix, &mut buf).unwrap();
        let back = read_tiff(Cursor::new(buf.into_inner())).unwrap();
        assert_eq!(back.depth(), PixelDepth::Bit8);
        assert_eq!(back.get_pixel(2, 2), Some(77));
    }

    #[test]
    fn test_convert_float_stretch() {
        let mut pm = Pix::new(3, 1, PixelDepth::Bit8).unwrap().to_mut();
        convert_float(&[0.5, 1.0, 1.5], &mut pm).unwrap();
        let pix: Pix = pm.into();
        assert_eq!(pix.get_pixel(0, 0), Some(0));
        assert_eq!(pix.get_pixel(1, 0), Some(128));
        assert_eq!(pix.get_pixel(2, 0), Some(255));
    }

    #[test]
    fn test_short_data_rejected() {
        let mut pm = Pix::new(4, 4, PixelDepth::Bit8).unwrap().to_mut();
        let result = convert_u8(&[0u8; 3], &mut pm, ColorType::Gray(8), false);
        assert!(matches!(result, Err(IoError::InvalidData(_))));
    }
}
