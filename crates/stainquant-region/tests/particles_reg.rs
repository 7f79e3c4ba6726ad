//! Particle analysis regression test
//!
//! Run with:
//! ```
//! cargo test -p stainquant-region --test particles_reg
//! ```

use stainquant_color::threshold_upper;
use stainquant_core::{Box, ImageFormat, color::GrayWeighting};
use stainquant_region::{Connectivity, ParticleOptions, analyze_particles};
use stainquant_test::RegParams;
use stainquant_test::fixtures::{gray_from_values, mask_from_rows, paint_rects, white_rgb};

#[test]
fn particles_reg() {
    let mut rp = RegParams::new("particles");

    // 2x2 black square in a 10x10 white image, pixel size 2
    let img = paint_rects(
        &white_rgb(10, 10).unwrap(),
        &[Box::new_unchecked(3, 3, 2, 2)],
        (0, 0, 0),
    )
    .unwrap();
    let gray = gray_from_values(
        10,
        10,
        &(0..100)
            .map(|i| if (3..5).contains(&(i % 10)) && (3..5).contains(&(i / 10)) { 0 } else { 255 })
            .collect::<Vec<u8>>(),
    )
    .unwrap();
    let mask = threshold_upper(&gray, 100).unwrap();
    let opts = ParticleOptions {
        measure_intensity: true,
        ..Default::default()
    };
    let a = analyze_particles(&mask, Some(&img), &opts).unwrap();
    rp.compare_values(1.0, a.count() as f64, 0.0);
    rp.compare_values(4.0, a.total_pixel_area() as f64, 0.0);
    rp.compare_values(16.0, a.total_scaled_area(2.0), 0.0);
    rp.compare_values(16.0, a.mean_scaled_area(2.0), 0.0);
    let p = &a.particles[0];
    rp.compare_values(3.0, p.bounds.x as f64, 0.0);
    rp.compare_values(2.0, p.bounds.w as f64, 0.0);
    let s = p.stats.unwrap();
    rp.compare_values(0.0, s.mean, 0.0);
    rp.compare_values(0.0, s.std_dev, 0.0);
    rp.compare_values(0.0, a.mask_stats.unwrap().max, 0.0);
    rp.compare_pix(&mask, &a.union_mask);
    rp.write_pix(&a.union_mask, ImageFormat::Png).unwrap();

    // Area conservation over several pixel sizes
    let rows = [
        "##......#.",
        "##.....##.",
        "..........",
        "....###...",
        "#...###..#",
        "....###...",
    ];
    let known = [4u64, 3, 9, 1, 1];
    let m = mask_from_rows(&rows).unwrap();
    let a = analyze_particles(&m, None, &ParticleOptions::default()).unwrap();
    rp.compare_values(known.len() as f64, a.count() as f64, 0.0);
    for (i, want) in known.iter().enumerate() {
        rp.compare_values(*want as f64, a.particles[i].area as f64, 0.0);
    }
    for ps in [0.25, 1.0, 1.5, 3.0] {
        let expected: f64 = known.iter().map(|&k| k as f64 * ps * ps).sum();
        rp.compare_values(expected, a.total_scaled_area(ps), 1e-9);
    }

    // Four-connectivity splits diagonal contacts
    let diag = mask_from_rows(&["#.#", ".#.", "#.#"]).unwrap();
    let eight = analyze_particles(&diag, None, &ParticleOptions::default()).unwrap();
    let four = analyze_particles(
        &diag,
        None,
        &ParticleOptions {
            connectivity: Connectivity::Four,
            ..Default::default()
        },
    )
    .unwrap();
    rp.compare_values(1.0, eight.count() as f64, 0.0);
    rp.compare_values(5.0, four.count() as f64, 0.0);

    // Empty mask: no particles, no statistics, no error
    let empty = mask_from_rows(&["....", "...."]).unwrap();
    let a = analyze_particles(&empty, None, &ParticleOptions::default()).unwrap();
    rp.compare_values(0.0, a.count() as f64, 0.0);
    rp.compare_values(0.0, a.mean_scaled_area(2.0), 0.0);

    // Weighted gray changes per-particle means on colour input
    let red = paint_rects(
        &white_rgb(4, 4).unwrap(),
        &[Box::new_unchecked(0, 0, 2, 2)],
        (255, 0, 0),
    )
    .unwrap();
    let sq = mask_from_rows(&["##..", "##..", "....", "...."]).unwrap();
    let unweighted = analyze_particles(&sq, Some(&red), &opts).unwrap();
    let weighted = analyze_particles(
        &sq,
        Some(&red),
        &ParticleOptions {
            weighting: GrayWeighting::Weighted,
            ..opts.clone()
        },
    )
    .unwrap();
    rp.compare_values(85.0, unweighted.particles[0].stats.unwrap().mean, 1e-9);
    rp.compare_values(0.299 * 255.0, weighted.particles[0].stats.unwrap().mean, 1e-9);

    assert!(rp.cleanup(), "particles regression test failed");
}
