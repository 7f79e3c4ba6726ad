//! Per-particle detail report

use crate::ReportResult;
use crate::csv::{quote, real3, record};
use crate::reporter::Reporter;
use stainquant_core::{Box, IntensityStats};

/// One accepted particle of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRow {
    /// Image identifier (relative path)
    pub identifier: String,
    /// 1-based particle index within the image
    pub index: u32,
    /// Scaled area
    pub area: f64,
    /// Circularity
    pub circularity: f64,
    /// Intensity statistics inside the particle, if measured
    pub stats: Option<IntensityStats>,
    /// Bounding box in pixels
    pub bounds: Box,
}

/// Table of every accepted particle across the batch.
#[derive(Debug, Clone, Default)]
pub struct ParticleReport {
    rows: Vec<ParticleRow>,
}

impl ParticleReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[ParticleRow] {
        &self.rows
    }
}

const HEADER: [&str; 12] = [
    "File",
    "Particle",
    "Area",
    "Circularity",
    "Mean",
    "StdDev",
    "Min",
    "Max",
    "BX",
    "BY",
    "Width",
    "Height",
];

impl Reporter for ParticleReport {
    type Row = ParticleRow;

    fn append(&mut self, row: ParticleRow) -> ReportResult<()> {
        self.rows.push(row);
        Ok(())
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn sort_by_identifier(&mut self) {
        // stable, so particle order within an image is kept
        self.rows.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    }

    fn render(&self) -> String {
        let mut out = record(HEADER);
        for r in &self.rows {
            let (mean, sd, min, max) = match r.stats {
                Some(s) => (s.mean, s.std_dev, s.min, s.max),
                None => (f64::NAN, f64::NAN, f64::NAN, f64::NAN),
            };
            out.push_str(&record([
                quote(&r.identifier),
                r.index.to_string(),
                real3(r.area),
                real3(r.circularity),
                real3(mean),
                real3(sd),
                real3(min),
                real3(max),
                r.bounds.x.to_string(),
                r.bounds.y.to_string(),
                r.bounds.w.to_string(),
                r.bounds.h.to_string(),
            ]));
        }
        out
    }

    fn kind(&self) -> &'static str {
        "particles"
    }
}
