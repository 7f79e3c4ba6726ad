//! Colour deconvolution
//!
//! Separates an RGB micrograph into three stain channels following the
//! method of Ruifrok & Johnston (2001). Each stain is described by an RGB
//! optical-density vector; the three vectors form the rows of a
//! [`StainMatrix`].
//!
//! # Algorithm
//!
//! 1. Normalise each stain vector to unit length. A missing second stain is
//!    a rotation of the first; a missing third stain is the unit complement
//!    of the first two. Zero components become 0.001.
//! 2. Invert the transposed matrix once.
//! 3. Per pixel, convert each of R, G, B to optical density
//!    `od = -255 ln((v + 1) / 255) / ln 255`, project onto the inverse, and
//!    map the concentration back to a transmitted intensity
//!    `exp(-(c - 255) ln 255 / 255)` clipped to `[0, 255]`.
//!
//! Lower values mean more stain. White maps to 255 in a channel only when
//! that row of the inverse sums to zero or less: white has a slightly
//! negative optical density, so an ill-conditioned matrix such as
//! [`StainMatrix::PAS`] leaves white just below 255 in its second channel.

use crate::{ColorError, ColorResult};
use stainquant_core::{Pix, PixelDepth, color};
use tracing::{debug, warn};

/// Component substituted for exact zeros in a normalised stain vector.
const ZERO_SUBSTITUTE: f64 = 0.001;

/// A 3x3 stain matrix: one row per stain, columns are R, G, B weights.
///
/// Rows need not be normalised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StainMatrix {
    rows: [[f64; 3]; 3],
}

impl StainMatrix {
    /// Oil Red O (lipid) with a tissue counterstain.
    pub const OIL_RED_O: StainMatrix = StainMatrix::new([
        [20.352661, 98.67872, 61.333855],
        [23.119661, 35.17482, 22.153309],
        [10.03157, 11.157111, 11.05758],
    ]);

    /// Periodic acid-Schiff.
    pub const PAS: StainMatrix = StainMatrix::new([
        [0.41607487, 0.8534002, 0.31399015],
        [0.5841384, 0.60622144, 0.53970164],
        [0.6657374, 0.001, 0.746186],
    ]);

    /// Haematoxylin and eosin; the third stain is derived.
    pub const H_E: StainMatrix = StainMatrix::new([
        [0.644211, 0.716556, 0.266844],
        [0.092789, 0.954111, 0.283111],
        [0.0, 0.0, 0.0],
    ]);

    /// Built-in matrices with their display names.
    pub const PRESETS: [(&'static str, StainMatrix); 3] = [
        ("oil-red-o", StainMatrix::OIL_RED_O),
        ("pas", StainMatrix::PAS),
        ("h-e", StainMatrix::H_E),
    ];

    /// Create a matrix from its rows.
    pub const fn new(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Create a matrix from nine values in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::InvalidMatrix`] if `values` does not hold
    /// exactly nine finite, non-negative numbers.
    pub fn from_slice(values: &[f64]) -> ColorResult<Self> {
        if values.len() != 9 {
            return Err(ColorError::InvalidMatrix(format!(
                "expected 9 values, got {}",
                values.len()
            )));
        }
        let mut rows = [[0.0; 3]; 3];
        for (i, v) in values.iter().enumerate() {
            rows[i / 3][i % 3] = *v;
        }
        let m = Self { rows };
        m.validate()?;
        Ok(m)
    }

    /// Look up a preset by name (case-insensitive).
    pub fn preset(name: &str) -> Option<StainMatrix> {
        Self::PRESETS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, m)| *m)
    }

    /// The rows as given.
    pub fn rows(&self) -> &[[f64; 3]; 3] {
        &self.rows
    }

    /// Check that every entry is finite and non-negative.
    ///
    /// Linear independence of the rows is not checked; a degenerate matrix
    /// is reported by [`Deconvolver::is_degenerate`].
    pub fn validate(&self) -> ColorResult<()> {
        for (i, row) in self.rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                if !v.is_finite() || *v < 0.0 {
                    return Err(ColorError::InvalidMatrix(format!(
                        "entry [{}][{}] = {} must be finite and non-negative",
                        i, c, v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Unit stain vectors after completion of missing rows and zero
    /// substitution.
    pub fn normalized(&self) -> [[f64; 3]; 3] {
        let mut cos = [[0.0f64; 3]; 3];
        for (i, row) in self.rows.iter().enumerate() {
            let len = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if len != 0.0 {
                cos[i] = [row[0] / len, row[1] / len, row[2] / len];
            }
        }

        if cos[1] == [0.0; 3] {
            cos[1] = [cos[0][2], cos[0][0], cos[0][1]];
        }

        if cos[2] == [0.0; 3] {
            for c in 0..3 {
                let s = cos[0][c] * cos[0][c] + cos[1][c] * cos[1][c];
                cos[2][c] = if s > 1.0 { 0.0 } else { (1.0 - s).sqrt() };
            }
            let len = cos[2].iter().map(|v| v * v).sum::<f64>().sqrt();
            if len != 0.0 {
                for v in &mut cos[2] {
                    *v /= len;
                }
            }
        }

        for row in &mut cos {
            for v in row.iter_mut() {
                if *v == 0.0 {
                    *v = ZERO_SUBSTITUTE;
                }
            }
        }
        cos
    }

    /// Inverse of the transposed normalised matrix, `q[stain][channel]`.
    ///
    /// Returns `None` when the stains are linearly dependent.
    pub fn unmixing(&self) -> Option<[[f64; 3]; 3]> {
        let cos = self.normalized();
        // a = cos^T, so a[c][i] = cos[i][c]
        let a = |r: usize, c: usize| cos[c][r];

        let det = a(0, 0) * (a(1, 1) * a(2, 2) - a(1, 2) * a(2, 1))
            - a(0, 1) * (a(1, 0) * a(2, 2) - a(1, 2) * a(2, 0))
            + a(0, 2) * (a(1, 0) * a(2, 1) - a(1, 1) * a(2, 0));
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let mut inv = [[0.0f64; 3]; 3];
        for (r, inv_row) in inv.iter_mut().enumerate() {
            for (c, out) in inv_row.iter_mut().enumerate() {
                // adjugate: transpose of the cofactor matrix
                let (r1, r2) = others(c);
                let (c1, c2) = others(r);
                let minor = a(r1, c1) * a(r2, c2) - a(r1, c2) * a(r2, c1);
                let sign = if (r + c) % 2 == 0 { 1.0 } else { -1.0 };
                *out = sign * minor / det;
            }
        }

        if inv.iter().flatten().all(|v| v.is_finite()) {
            Some(inv)
        } else {
            None
        }
    }
}

/// The two indices of `0..3` other than `i`, in ascending order.
fn others(i: usize) -> (usize, usize) {
    match i {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

/// Prepared deconvolution for one stain matrix.
///
/// Build it once per batch and reuse it for every image.
#[derive(Debug, Clone)]
pub struct Deconvolver {
    matrix: StainMatrix,
    q: Option<[[f64; 3]; 3]>,
    od: [f64; 256],
}

impl Deconvolver {
    /// Prepare a deconvolver.
    ///
    /// A matrix whose stains are linearly dependent is accepted; a warning
    /// is logged and every channel it produces is 255 (no stain).
    pub fn new(matrix: &StainMatrix) -> Self {
        let q = matrix.unmixing();
        if q.is_none() {
            warn!(
                rows = ?matrix.rows(),
                "stain matrix is degenerate; channels will carry no stain signal"
            );
        } else {
            debug!(q = ?q, "prepared stain unmixing matrix");
        }

        let log255 = 255f64.ln();
        let mut od = [0.0f64; 256];
        for (v, slot) in od.iter_mut().enumerate() {
            *slot = -(255.0 * ((v as f64 + 1.0) / 255.0).ln()) / log255;
        }

        Self {
            matrix: *matrix,
            q,
            od,
        }
    }

    /// The matrix this deconvolver was built from.
    pub fn matrix(&self) -> &StainMatrix {
        &self.matrix
    }

    /// True if the matrix could not be inverted.
    pub fn is_degenerate(&self) -> bool {
        self.q.is_none()
    }

    /// Unmix one RGB pixel into three 8-bit stain intensities.
    pub fn unmix_pixel(&self, r: u8, g: u8, b: u8) -> [u8; 3] {
        let Some(q) = &self.q else {
            return [255; 3];
        };
        let od = [self.od[r as usize], self.od[g as usize], self.od[b as usize]];
        let log255 = 255f64.ln();
        let mut out = [0u8; 3];
        for (i, slot) in out.iter_mut().enumerate() {
            let c = od[0] * q[i][0] + od[1] * q[i][1] + od[2] * q[i][2];
            let v = (-(c - 255.0) * log255 / 255.0).exp();
            *slot = v.clamp(0.0, 255.0).round() as u8;
        }
        out
    }

    /// Deconvolve a 32 bpp RGB image into three 8 bpp stain channels.
    ///
    /// The channels carry the text `Channel_1`, `Channel_2`, `Channel_3`.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::UnsupportedDepth`] if `pix` is not 32 bpp.
    pub fn deconvolve(&self, pix: &Pix) -> ColorResult<[Pix; 3]> {
        if pix.depth() != PixelDepth::Bit32 {
            return Err(ColorError::UnsupportedDepth {
                expected: "32 bpp RGB",
                actual: pix.depth().bits(),
            });
        }

        let (w, h) = (pix.width(), pix.height());
        let mut channels = [
            Pix::new(w, h, PixelDepth::Bit8)?.to_mut(),
            Pix::new(w, h, PixelDepth::Bit8)?.to_mut(),
            Pix::new(w, h, PixelDepth::Bit8)?.to_mut(),
        ];

        for y in 0..h {
            for x in 0..w {
                let (r, g, b) = color::extract_rgb(pix.get_pixel_unchecked(x, y));
                let out = self.unmix_pixel(r, g, b);
                for (ch, v) in channels.iter_mut().zip(out) {
                    ch.set_pixel_unchecked(x, y, u32::from(v));
                }
            }
        }

        for (i, ch) in channels.iter_mut().enumerate() {
            ch.set_informat(pix.informat());
            ch.set_text(Some(format!("Channel_{}", i + 1)));
        }
        Ok(channels.map(Pix::from))
    }
}

/// Deconvolve `pix` with `matrix`.
///
/// Convenience wrapper around [`Deconvolver`]; prefer building one
/// deconvolver when processing many images.
pub fn deconvolve(pix: &Pix, matrix: &StainMatrix) -> ColorResult<[Pix; 3]> {
    Deconvolver::new(matrix).deconvolve(pix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rows_are_unit_length() {
        for (_, m) in StainMatrix::PRESETS {
            for row in m.normalized() {
                let len = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                assert!((len - 1.0).abs() < 1e-5, "row length {}", len);
            }
        }
    }

    #[test]
    fn test_missing_third_row_is_complement() {
        let cos = StainMatrix::H_E.normalized();
        for c in 0..3 {
            assert!(cos[2][c] > 0.0);
        }
        // third stain is roughly orthogonal in the squared sense
        let dot: f64 = (0..3).map(|c| cos[2][c]).sum();
        assert!(dot > 0.0);
    }

    #[test]
    fn test_missing_second_row_is_rotation() {
        let m = StainMatrix::new([[1.0, 2.0, 2.0], [0.0; 3], [0.0, 0.0, 1.0]]);
        let cos = m.normalized();
        assert!(approx(cos[1][0], 2.0 / 3.0));
        assert!(approx(cos[1][1], 1.0 / 3.0));
        assert!(approx(cos[1][2], 2.0 / 3.0));
    }

    #[test]
    fn test_zero_component_substituted() {
        let m = StainMatrix::new([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let cos = m.normalized();
        assert_eq!(cos[0][1], ZERO_SUBSTITUTE);
        assert_eq!(cos[0][0], 1.0);
    }

    #[test]
    fn test_unmixing_inverts_transpose() {
        let m = StainMatrix::OIL_RED_O;
        let cos = m.normalized();
        let q = m.unmixing().unwrap();
        // q * cos^T == I
        for i in 0..3 {
            for j in 0..3 {
                let v: f64 = (0..3).map(|k| q[i][k] * cos[j][k]).sum();
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((v - want).abs() < 1e-9, "({}, {}) = {}", i, j, v);
            }
        }
    }

    #[test]
    fn test_white_unmixing() {
        let d = Deconvolver::new(&StainMatrix::OIL_RED_O);
        assert_eq!(d.unmix_pixel(255, 255, 255), [255, 255, 255]);
        // Second PAS row of the inverse sums above zero
        let d = Deconvolver::new(&StainMatrix::PAS);
        assert_eq!(d.unmix_pixel(255, 255, 255), [255, 247, 255]);
    }

    #[test]
    fn test_pure_stain_lands_in_its_channel() {
        // Pixel whose optical density is a pure multiple of stain 1
        let m = StainMatrix::H_E;
        let cos = m.normalized();
        let log255 = 255f64.ln();
        let conc = 100.0;
        let rgb: Vec<u8> = (0..3)
            .map(|c| {
                let od = conc * cos[0][c];
                let v = 255.0 * (-od * log255 / 255.0).exp() - 1.0;
                v.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        let d = Deconvolver::new(&m);
        let out = d.unmix_pixel(rgb[0], rgb[1], rgb[2]);
        assert!(out[0] < 200, "stain 1 channel = {}", out[0]);
        assert!(out[1] > 240, "stain 2 channel = {}", out[1]);
        assert!(out[2] > 240, "stain 3 channel = {}", out[2]);
    }

    #[test]
    fn test_degenerate_matrix_fills_255() {
        let m = StainMatrix::new([[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]);
        let d = Deconvolver::new(&m);
        assert!(d.is_degenerate());
        assert_eq!(d.unmix_pixel(10, 20, 30), [255, 255, 255]);
    }

    #[test]
    fn test_from_slice_validation() {
        assert!(StainMatrix::from_slice(&[1.0; 8]).is_err());
        let mut v = [1.0; 9];
        v[4] = -0.5;
        assert!(StainMatrix::from_slice(&v).is_err());
        v[4] = f64::NAN;
        assert!(StainMatrix::from_slice(&v).is_err());
        let m = StainMatrix::from_slice(&[1., 2., 3., 4., 5., 6., 7., 8., 10.]).unwrap();
        assert_eq!(m.rows()[2], [7.0, 8.0, 10.0]);
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(StainMatrix::preset("PAS"), Some(StainMatrix::PAS));
        assert_eq!(StainMatrix::preset("unknown"), None);
    }

    #[test]
    fn test_deconvolve_requires_rgb() {
        let gray = Pix::new(2, 2, PixelDepth::Bit8).unwrap();
        assert!(deconvolve(&gray, &StainMatrix::PAS).is_err());
    }

    #[test]
    fn test_deconvolve_channels() {
        let pix = Pix::new_filled(3, 2, PixelDepth::Bit32, color::compose_rgb(255, 255, 255))
            .unwrap();
        let chans = deconvolve(&pix, &StainMatrix::OIL_RED_O).unwrap();
        for (i, ch) in chans.iter().enumerate() {
            assert_eq!(ch.depth(), PixelDepth::Bit8);
            assert_eq!(ch.text(), Some(format!("Channel_{}", i + 1).as_str()));
            assert_eq!(ch.get_pixel(2, 1), Some(255));
        }
    }
}
