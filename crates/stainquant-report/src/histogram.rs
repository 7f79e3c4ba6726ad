//! Histogram report
//!
//! Accumulates the per-channel intensity histograms of each image. The
//! table lists the first channel's counts for intensities 0 to 250, one
//! column per image, followed by a blank line and the mean, standard
//! deviation and median of that channel.

use crate::csv::{quote, real2, record};
use crate::reporter::Reporter;
use crate::{ReportError, ReportResult};
use stainquant_core::{Histogram, HistogramStats};

/// Highest intensity listed in the table.
pub const MAX_INTENSITY: usize = 250;

/// Histograms of one image, one per stain channel.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramRecord {
    /// Image identifier (relative path)
    pub identifier: String,
    /// Channel histograms; the first one is reported
    pub channels: Vec<Histogram>,
}

impl HistogramRecord {
    /// Histogram of the reported channel.
    pub fn primary(&self) -> Option<&Histogram> {
        self.channels.first()
    }

    /// Mean, standard deviation and median of the first channel over 0..=250.
    pub fn stats(&self) -> ReportResult<HistogramStats> {
        let hist = self.primary().ok_or_else(|| ReportError::RowMismatch {
            identifier: self.identifier.clone(),
            message: "record has no channel".to_string(),
        })?;
        Ok(hist.stats_on_interval(0, MAX_INTENSITY)?)
    }
}

/// Histogram table.
#[derive(Debug, Clone, Default)]
pub struct HistogramReport {
    records: Vec<HistogramRecord>,
    stats: Vec<HistogramStats>,
}

impl HistogramReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in append order.
    pub fn records(&self) -> &[HistogramRecord] {
        &self.records
    }
}

impl Reporter for HistogramReport {
    type Row = HistogramRecord;

    fn append(&mut self, row: HistogramRecord) -> ReportResult<()> {
        let stats = row.stats()?;
        self.records.push(row);
        self.stats.push(stats);
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn sort_by_identifier(&mut self) {
        let mut pairs: Vec<_> = self
            .records
            .drain(..)
            .zip(self.stats.drain(..))
            .collect();
        pairs.sort_by(|a, b| a.0.identifier.cmp(&b.0.identifier));
        let (records, stats): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        self.records = records;
        self.stats = stats;
    }

    fn render(&self) -> String {
        let mut header = vec!["Intensity".to_string()];
        header.extend(
            self.records
                .iter()
                .map(|r| quote(&format!("Count_{}", r.identifier))),
        );
        let mut out = record(header);

        for i in 0..=MAX_INTENSITY {
            let mut fields = vec![i.to_string()];
            // append() checked that a primary channel with enough bins exists
            fields.extend(
                self.records
                    .iter()
                    .map(|r| r.primary().map_or(0, |h| h.count(i)).to_string()),
            );
            out.push_str(&record(fields));
        }
        out.push('\n');

        let summary: [(&str, fn(&HistogramStats) -> String); 3] = [
            ("Mean", |s| real2(s.mean)),
            ("StdDev", |s| real2(s.std_dev)),
            ("Median", |s| s.median.to_string()),
        ];
        for (name, fmt) in summary {
            let mut fields = vec![name.to_string()];
            fields.extend(self.stats.iter().map(fmt));
            out.push_str(&record(fields));
        }
        out
    }

    fn kind(&self) -> &'static str {
        "histogram"
    }
}
