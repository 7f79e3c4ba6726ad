//! Deconvolution and threshold regression test
//!
//! Run with:
//! ```
//! cargo test -p stainquant-color --test deconvolve_reg
//! ```

use stainquant_color::{Deconvolver, StainMatrix, threshold_upper};
use stainquant_core::{Box, ImageFormat};
use stainquant_test::RegParams;
use stainquant_test::fixtures::{paint_rects, white_rgb};

#[test]
fn deconvolve_reg() {
    let mut rp = RegParams::new("deconvolve");

    // Red lipid droplets (Oil Red O) on a white field
    let field = white_rgb(20, 12).unwrap();
    let stained = paint_rects(
        &field,
        &[Box::new_unchecked(2, 2, 4, 3), Box::new_unchecked(12, 6, 5, 5)],
        (200, 30, 40),
    )
    .unwrap();

    let d = Deconvolver::new(&StainMatrix::OIL_RED_O);
    rp.compare_values(0.0, d.is_degenerate() as u8 as f64, 0.0);

    // Deterministic: two runs give bit-identical channels
    let first = d.deconvolve(&stained).unwrap();
    let second = d.deconvolve(&stained).unwrap();
    for (a, b) in first.iter().zip(&second) {
        rp.compare_pix(a, b);
    }

    for ch in &first {
        rp.write_pix(ch, ImageFormat::Png).unwrap();
    }

    // White background is unstained in every Oil Red O channel
    for ch in &first {
        rp.compare_values(255.0, ch.get_pixel(0, 0).unwrap() as f64, 0.0);
        rp.compare_values(20.0 * 12.0, ch.pixel_count() as f64, 0.0);
    }

    // PAS leaves white slightly below 255 in its second channel
    let pas = Deconvolver::new(&StainMatrix::PAS).deconvolve(&field).unwrap();
    let white: Vec<f64> = pas.iter().map(|ch| ch.get_pixel(5, 5).unwrap() as f64).collect();
    rp.compare_values(255.0, white[0], 0.0);
    rp.compare_values(247.0, white[1], 0.0);
    rp.compare_values(255.0, white[2], 0.0);

    // Stained pixels are darker than background in channel 1
    let c1 = &first[0];
    let stain_val = c1.get_pixel(3, 3).unwrap();
    rp.compare_values(1.0, (stain_val < 255) as u8 as f64, 0.0);

    // Threshold monotonicity: T1 < T2 implies mask(T1) subset of mask(T2)
    let thresholds = [0u8, 60, 120, 150, 200, 254, 255];
    let masks: Vec<_> = thresholds
        .iter()
        .map(|&t| threshold_upper(c1, t).unwrap())
        .collect();
    for pair in masks.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        let union = lo.or(hi).unwrap();
        rp.compare_values(hi.count_pixels() as f64, union.count_pixels() as f64, 0.0);
    }
    rp.compare_values(240.0, masks[6].count_pixels() as f64, 0.0);

    // Degenerate matrix: no error, channels carry no stain
    let flat = StainMatrix::new([[1.0, 1.0, 1.0]; 3]);
    let dd = Deconvolver::new(&flat);
    rp.compare_values(1.0, dd.is_degenerate() as u8 as f64, 0.0);
    let chans = dd.deconvolve(&stained).unwrap();
    for ch in &chans {
        rp.compare_values(255.0, ch.get_pixel(3, 3).unwrap() as f64, 0.0);
        rp.compare_values(0.0, threshold_upper(ch, 254).unwrap().count_pixels() as f64, 0.0);
    }

    // Pure black saturates towards strong stain in at least one channel
    let black = paint_rects(&field, &[Box::new_unchecked(0, 0, 1, 1)], (0, 0, 0)).unwrap();
    let out = d.deconvolve(&black).unwrap();
    let darkest = out.iter().map(|c| c.get_pixel(0, 0).unwrap()).min().unwrap();
    rp.compare_values(1.0, (darkest < 128) as u8 as f64, 0.0);

    assert!(rp.cleanup(), "deconvolve regression test failed");
}
