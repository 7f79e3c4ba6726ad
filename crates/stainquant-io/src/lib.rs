//! stainquant-io - Image decoding and discovery
//!
//! Reads the micrographs fed to the stainquant pipeline and finds them on
//! disk:
//!
//! - PNG, JPEG and TIFF decoding (format chosen by magic bytes)
//! - PNG and TIFF encoding for masks and test fixtures
//! - [`ImageSource`]: a lazy depth-first walk yielding [`SourceEntry`] items
//!
//! # Example
//!
//! ```no_run
//! use stainquant_io::ImageSource;
//!
//! for entry in ImageSource::new("slides").unwrap() {
//!     let pix = entry.read_rgb().unwrap();
//!     println!("{}: {}x{}", entry.identifier, pix.width(), pix.height());
//! }
//! ```

mod error;
pub mod format;
pub mod source;

#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png-format")]
pub mod png;
#[cfg(feature = "tiff-format")]
pub mod tiff;

pub use error::{IoError, IoResult};
pub use format::{detect_format, detect_format_from_bytes, has_image_extension};
pub use source::{ImageSource, SourceEntry};
pub use stainquant_core::ImageFormat;

use stainquant_core::{Pix, PixelDepth};
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

/// Read an image from a file, detecting the format from its content.
pub fn read_image<P: AsRef<Path>>(path: P) -> IoResult<Pix> {
    let format = detect_format(path.as_ref())?;
    let reader = BufReader::new(File::open(path.as_ref())?);
    read_image_format(reader, format)
}

/// Read an image and promote it to 32 bpp RGB.
///
/// Deconvolution works on RGB only; grayscale inputs get R = G = B.
pub fn read_image_rgb<P: AsRef<Path>>(path: P) -> IoResult<Pix> {
    let pix = read_image(path)?;
    match pix.depth() {
        PixelDepth::Bit32 => Ok(pix),
        _ => Ok(pix.convert_to_rgb()?),
    }
}

#[allow(unused_variables)]
fn read_image_format<R: std::io::BufRead + Seek>(reader: R, format: ImageFormat) -> IoResult<Pix> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::read_png(reader),
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => jpeg::read_jpeg(reader),
        #[cfg(feature = "tiff-format")]
        ImageFormat::Tiff => tiff::read_tiff(reader),
        _ => Err(IoError::UnsupportedFormat(format!(
            "no decoder for {:?}",
            format
        ))),
    }
}

/// Write an image to a file in the given format.
///
/// PNG and TIFF output are supported; JPEG is read-only.
pub fn write_image<P: AsRef<Path>>(pix: &Pix, path: P, format: ImageFormat) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_image_format(pix, &mut writer, format)?;
    writer.flush()?;
    Ok(())
}

#[allow(unused_variables)]
fn write_image_format<W: Write + Seek>(pix: &Pix, writer: W, format: ImageFormat) -> IoResult<()> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::write_png(pix, writer),
        #[cfg(feature = "tiff-format")]
        ImageFormat::Tiff => tiff::write_tiff(pix, writer),
        _ => Err(IoError::UnsupportedFormat(format!(
            "no encoder for {:?}",
            format
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("stainquant-io-lib");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_read_unknown_format() {
        let path = temp_path("unknown.png");
        std::fs::write(&path, b"not an image at all").unwrap();
        assert!(matches!(
            read_image(&path),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_jpeg_write_unsupported() {
        let pix = Pix::new(2, 2, PixelDepth::Bit8).unwrap();
        assert!(write_image(&pix, temp_path("out.jpg"), ImageFormat::Jpeg).is_err());
    }

    #[test]
    fn test_file_roundtrip_png() {
        let pix = Pix::new_filled(4, 3, PixelDepth::Bit8, 9).unwrap();
        let path = temp_path("roundtrip.png");
        write_image(&pix, &path, ImageFormat::Png).unwrap();
        let back = read_image(&path).unwrap();
        assert_eq!(back.get_pixel(3, 2), Some(9));
        let rgb = read_image_rgb(&path).unwrap();
        assert_eq!(rgb.get_rgb(0, 0), Some((9, 9, 9)));
    }
}
