//! Area-accounting report
//!
//! One row per image with particle count and area, the intensity
//! statistics inside the particle mask and, when a background channel is
//! used, the background and residual ("parenchyma") areas.

use crate::csv::{quote, real3, record};
use crate::reporter::Reporter;
use crate::{ReportError, ReportResult};
use stainquant_core::IntensityStats;

/// Background and residual tissue areas of one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundArea {
    /// Background-channel area in physical units
    pub background: f64,
    /// `total − foreground − background` in physical units
    pub parenchyma: f64,
}

impl BackgroundArea {
    /// Build from pixel counts.
    ///
    /// The residual is computed on integer counts before scaling, so
    /// `total == foreground + background + parenchyma` holds up to a
    /// single multiplication. It is negative when foreground and
    /// background overlap by more than the remaining pixels.
    pub fn from_pixels(total_px: u64, foreground_px: u64, background_px: u64, pixel_size: f64) -> Self {
        let scale = pixel_size * pixel_size;
        let residual = total_px as i64 - foreground_px as i64 - background_px as i64;
        Self {
            background: background_px as f64 * scale,
            parenchyma: residual as f64 * scale,
        }
    }
}

/// Summary row for one processed image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    /// Image identifier (relative path)
    pub identifier: String,
    /// Number of accepted particles
    pub particle_count: usize,
    /// Sum of scaled particle areas
    pub total_area: f64,
    /// Mean scaled particle area
    pub mean_area: f64,
    /// Intensity statistics over the union of the particles
    pub mask_stats: IntensityStats,
    /// Present when a background channel was thresholded
    pub background: Option<BackgroundArea>,
}

/// Area-accounting table.
#[derive(Debug, Clone, Default)]
pub struct AreaReport {
    with_background: bool,
    rows: Vec<ImageResult>,
}

impl AreaReport {
    /// Create an empty report; `with_background` adds the background and
    /// parenchyma columns.
    pub fn new(with_background: bool) -> Self {
        Self {
            with_background,
            rows: Vec::new(),
        }
    }

    /// Whether the background columns are present.
    pub fn with_background(&self) -> bool {
        self.with_background
    }

    /// Rows in append order.
    pub fn rows(&self) -> &[ImageResult] {
        &self.rows
    }

    /// Column names in output order.
    pub fn header(&self) -> Vec<&'static str> {
        let mut cols = vec![
            "File",
            "Total Area",
            "Total Particles",
            "Mean Area",
            "Mask Mean",
            "Mask StdDev",
            "Mask Min",
            "Mask Max",
        ];
        if self.with_background {
            cols.extend(["Background Area", "Parenchyma Area"]);
        }
        cols
    }
}

impl Reporter for AreaReport {
    type Row = ImageResult;

    fn append(&mut self, row: ImageResult) -> ReportResult<()> {
        if row.background.is_some() != self.with_background {
            return Err(ReportError::RowMismatch {
                identifier: row.identifier,
                message: format!(
                    "background columns expected: {}, row has background: {}",
                    self.with_background,
                    !self.with_background
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn sort_by_identifier(&mut self) {
        self.rows.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    }

    fn render(&self) -> String {
        let mut out = record(self.header());
        for r in &self.rows {
            let mut fields = vec![
                quote(&r.identifier),
                real3(r.total_area),
                r.particle_count.to_string(),
                real3(r.mean_area),
                real3(r.mask_stats.mean),
                real3(r.mask_stats.std_dev),
                real3(r.mask_stats.min),
                real3(r.mask_stats.max),
            ];
            if let Some(bg) = r.background {
                fields.push(real3(bg.background));
                fields.push(real3(bg.parenchyma));
            }
            out.push_str(&record(fields));
        }
        out
    }

    fn kind(&self) -> &'static str {
        "area"
    }
}
