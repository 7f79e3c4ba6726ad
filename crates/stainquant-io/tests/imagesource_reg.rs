//! Image source regression test
//!
//! Writes a small tree of PNG/TIFF files (plus decoys) into a scratch
//! directory, walks it and decodes every discovered entry.
//!
//! Run with:
//! ```
//! cargo test -p stainquant-io --test imagesource_reg
//! ```

use stainquant_core::{Box, PixelDepth};
use stainquant_io::{ImageFormat, ImageSource, read_image, read_image_rgb};
use stainquant_test::RegParams;
use stainquant_test::fixtures::{paint_rects, scratch_dir, white_rgb, write_bytes, write_fixture};

#[test]
fn imagesource_reg() {
    let mut rp = RegParams::new("imagesource");

    let dir = scratch_dir("imagesource_tree").unwrap();
    let base = white_rgb(12, 8).unwrap();
    let marked = paint_rects(&base, &[Box::new_unchecked(2, 2, 3, 3)], (180, 40, 40)).unwrap();

    write_fixture(&dir, "b.png", &marked, ImageFormat::Png).unwrap();
    write_fixture(&dir, "A.TIF", &marked, ImageFormat::Tiff).unwrap();
    write_fixture(&dir, "liver/a/img1.tif", &base, ImageFormat::Tiff).unwrap();
    write_fixture(&dir, "liver/img1.png", &base, ImageFormat::Png).unwrap();
    write_bytes(&dir, "notes.txt", b"not an image").unwrap();
    write_bytes(&dir, "liver/broken.jpg", b"\xff\xd8\xff garbage").unwrap();

    let entries: Vec<_> = ImageSource::new(&dir).unwrap().collect();
    let ids: Vec<&str> = entries.iter().map(|e| e.identifier.as_str()).collect();

    // Case-insensitive extension match, text file skipped, file-name order
    rp.compare_values(5.0, entries.len() as f64, 0.0);
    let expected = [
        "A.TIF",
        "b.png",
        "liver/a/img1.tif",
        "liver/broken.jpg",
        "liver/img1.png",
    ];
    for (want, got) in expected.iter().zip(&ids) {
        rp.compare_strings(want.as_bytes(), got.as_bytes());
    }

    // Decoding by content: PNG and TIFF read back identically
    let tif = read_image(&entries[0].path).unwrap();
    let png = read_image(&entries[1].path).unwrap();
    rp.compare_pix(&tif, &png);
    rp.compare_pix(&marked, &png);
    rp.compare_values(32.0, png.depth().bits() as f64, 0.0);

    // The corrupt JPEG is a per-file decode error, not a panic
    rp.compare_values(1.0, entries[3].read_rgb().is_err() as u8 as f64, 0.0);

    // Grayscale input is promoted to RGB
    let gray = stainquant_core::Pix::new_filled(4, 4, PixelDepth::Bit8, 60).unwrap();
    let gray_path = write_fixture(&dir, "gray/g.png", &gray, ImageFormat::Png).unwrap();
    let promoted = read_image_rgb(&gray_path).unwrap();
    rp.compare_values(32.0, promoted.depth().bits() as f64, 0.0);
    let (r, g, b) = promoted.get_rgb(3, 3).unwrap();
    rp.compare_values(60.0, r as f64, 0.0);
    rp.compare_values(60.0, g as f64, 0.0);
    rp.compare_values(60.0, b as f64, 0.0);

    // A missing root is a configuration error
    rp.compare_values(
        1.0,
        ImageSource::new(dir.join("missing")).is_err() as u8 as f64,
        0.0,
    );

    assert!(rp.cleanup(), "imagesource regression test failed");
}
