//! Synthetic fixtures
//!
//! Small rasters built in code, and scratch directories populated with
//! image files for batch tests.

use crate::error::{TestError, TestResult};
use crate::regout_dir;
use stainquant_core::{Box, Pix, PixelDepth, color};
use stainquant_io::ImageFormat;
use std::fs;
use std::path::{Path, PathBuf};

/// White RGB image of the given size.
pub fn white_rgb(width: u32, height: u32) -> TestResult<Pix> {
    Ok(Pix::new_filled(
        width,
        height,
        PixelDepth::Bit32,
        color::compose_rgb(255, 255, 255),
    )?)
}

/// Paint the rectangles `rects` of `pix` (32 bpp) with `rgb`.
pub fn paint_rects(pix: &Pix, rects: &[Box], rgb: (u8, u8, u8)) -> TestResult<Pix> {
    let mut pm = pix.to_mut();
    for r in rects {
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                if x >= 0 && y >= 0 {
                    pm.set_rgb(x as u32, y as u32, rgb.0, rgb.1, rgb.2)?;
                }
            }
        }
    }
    Ok(pm.into())
}

/// Build a 1 bpp mask from rows of text, `#` for ON and anything else OFF.
///
/// ```
/// let mask = stainquant_test::fixtures::mask_from_rows(&[
///     "##..",
///     "#...",
/// ]).unwrap();
/// assert_eq!(mask.count_pixels(), 3);
/// ```
pub fn mask_from_rows(rows: &[&str]) -> TestResult<Pix> {
    let height = rows.len() as u32;
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
    let mut pm = Pix::new(width, height, PixelDepth::Bit1)?.to_mut();
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            if ch == '#' {
                pm.set_pixel(x as u32, y as u32, 1)?;
            }
        }
    }
    Ok(pm.into())
}

/// Build an 8 bpp image from a row-major slice of values.
pub fn gray_from_values(width: u32, height: u32, values: &[u8]) -> TestResult<Pix> {
    let mut pm = Pix::new(width, height, PixelDepth::Bit8)?.to_mut();
    for y in 0..height {
        for x in 0..width {
            let v = values
                .get((y * width + x) as usize)
                .copied()
                .unwrap_or(0);
            pm.set_pixel(x, y, u32::from(v))?;
        }
    }
    Ok(pm.into())
}

/// Create an empty scratch directory `tests/regout/<name>`.
///
/// Any previous contents are removed.
pub fn scratch_dir(name: &str) -> TestResult<PathBuf> {
    let dir = PathBuf::from(regout_dir()).join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir).map_err(|e| TestError::DirectoryCreate {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Write `pix` to `dir/rel`, creating intermediate directories.
pub fn write_fixture(dir: &Path, rel: &str, pix: &Pix, format: ImageFormat) -> TestResult<PathBuf> {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    stainquant_io::write_image(pix, &path, format).map_err(|e| TestError::ImageWrite {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(path)
}

/// Write arbitrary bytes to `dir/rel` (e.g. a corrupt image).
pub fn write_bytes(dir: &Path, rel: &str, data: &[u8]) -> TestResult<PathBuf> {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, data)?;
    Ok(path)
}
