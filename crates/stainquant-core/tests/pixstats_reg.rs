//! Pixel statistics regression test
//!
//! Masks, masked intensity statistics and histogram summaries on
//! synthetic rasters.
//!
//! Run with:
//! ```
//! cargo test -p stainquant-core --test pixstats_reg
//! ```

use stainquant_core::color::GrayWeighting;
use stainquant_core::{Histogram, Pix, PixelDepth, color};
use stainquant_test::RegParams;

/// 8x6 RGB image: left half gray 40, right half gray 200
fn make_split_rgb() -> Pix {
    let pix = Pix::new(8, 6, PixelDepth::Bit32).unwrap();
    let mut pm = pix.try_into_mut().unwrap();
    for y in 0..6 {
        for x in 0..8 {
            let g = if x < 4 { 40 } else { 200 };
            pm.set_pixel_unchecked(x, y, color::compose_rgb(g, g, g));
        }
    }
    pm.into()
}

/// 8x6 mask with the left half ON
fn make_left_mask() -> Pix {
    let pix = Pix::new(8, 6, PixelDepth::Bit1).unwrap();
    let mut pm = pix.try_into_mut().unwrap();
    for y in 0..6 {
        for x in 0..4 {
            pm.set_pixel_unchecked(x, y, 1);
        }
    }
    pm.into()
}

#[test]
fn pixstats_reg() {
    let mut rp = RegParams::new("pixstats");

    let rgb = make_split_rgb();
    let left = make_left_mask();

    // Mask counting and complement
    rp.compare_values(24.0, left.count_pixels() as f64, 0.0);
    let right = left.invert().unwrap();
    rp.compare_values(24.0, right.count_pixels() as f64, 0.0);
    let all = left.or(&right).unwrap();
    rp.compare_values(48.0, all.count_pixels() as f64, 0.0);

    // Masked statistics on each half
    let sl = rgb
        .intensity_stats_masked(&left, GrayWeighting::Unweighted)
        .unwrap()
        .unwrap();
    rp.compare_values(40.0, sl.mean, 1e-9);
    rp.compare_values(0.0, sl.std_dev, 1e-9);
    let sr = rgb
        .intensity_stats_masked(&right, GrayWeighting::Weighted)
        .unwrap()
        .unwrap();
    rp.compare_values(200.0, sr.mean, 1e-9);

    // Both halves together: 24 x 40 and 24 x 200
    let sa = rgb
        .intensity_stats_masked(&all, GrayWeighting::Unweighted)
        .unwrap()
        .unwrap();
    rp.compare_values(120.0, sa.mean, 1e-9);
    rp.compare_values(40.0, sa.min, 0.0);
    rp.compare_values(200.0, sa.max, 0.0);
    let expected_sd = (48.0 * 80.0f64 * 80.0 / 47.0).sqrt();
    rp.compare_values(expected_sd, sa.std_dev, 1e-9);

    // Gray histogram of the promoted-then-reduced image
    let gray = Pix::new_filled(10, 10, PixelDepth::Bit8, 100).unwrap();
    let hist = gray.gray_histogram().unwrap();
    rp.compare_values(100.0, hist.count(100) as f64, 0.0);
    let stats = hist.stats_on_interval(0, 250).unwrap();
    rp.compare_values(100.0, stats.mean, 1e-12);
    rp.compare_values(100.0, stats.median as f64, 0.0);

    // Two-spike histogram: the median resolves to the first bin
    let mut counts = vec![0u64; 256];
    counts[0] = 10;
    counts[100] = 10;
    let stats = Histogram::from_counts(counts)
        .stats_on_interval(0, 250)
        .unwrap();
    rp.compare_values(50.0, stats.mean, 1e-12);
    rp.compare_values(50.0, stats.std_dev, 1e-12);
    rp.compare_values(0.0, stats.median as f64, 0.0);

    // Promotion to RGB preserves the values
    let promoted = gray.convert_to_rgb().unwrap();
    rp.compare_values(
        100.0,
        promoted.intensity_at(9, 9, GrayWeighting::Unweighted).unwrap(),
        1e-12,
    );

    assert!(rp.cleanup(), "pixstats regression test failed");
}
