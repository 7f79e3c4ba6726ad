//! Histogram - Binned intensity counts
//!
//! A [`Histogram`] holds one count per integer intensity, starting at 0.
//! [`HistogramStats`] summarises a contiguous interval of bins with the
//! mean, population standard deviation and median used by the histogram
//! report.

use crate::error::{Error, Result};

/// Integer intensity histogram (bin `i` counts pixels of value `i`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    /// Create an empty histogram with `bins` zeroed bins.
    pub fn new(bins: usize) -> Self {
        Self {
            counts: vec![0; bins],
        }
    }

    /// Create a histogram from existing counts.
    pub fn from_counts(counts: Vec<u64>) -> Self {
        Self { counts }
    }

    /// Number of bins.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True if the histogram has no bins.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count in bin `i`, or 0 if `i` is past the last bin.
    #[inline]
    pub fn count(&self, i: usize) -> u64 {
        self.counts.get(i).copied().unwrap_or(0)
    }

    /// All bin counts.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Add one to bin `i`. Values past the last bin are ignored.
    #[inline]
    pub fn increment(&mut self, i: usize) {
        if let Some(c) = self.counts.get_mut(i) {
            *c += 1;
        }
    }

    /// Sum of all bins.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Summary statistics over the inclusive bin interval `[lo, hi]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `lo > hi` or `hi` is not a bin.
    pub fn stats_on_interval(&self, lo: usize, hi: usize) -> Result<HistogramStats> {
        if lo > hi || hi >= self.counts.len() {
            return Err(Error::InvalidParameter(format!(
                "invalid histogram interval [{}, {}] for {} bins",
                lo,
                hi,
                self.counts.len()
            )));
        }
        Ok(HistogramStats::on_interval(&self.counts[lo..=hi], lo))
    }
}

/// Mean, standard deviation and median of a run of histogram bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramStats {
    /// Total count over the interval
    pub total: u64,
    /// Weighted mean intensity (`NaN` when `total == 0`)
    pub mean: f64,
    /// Population standard deviation (`NaN` when `total == 0`)
    pub std_dev: f64,
    /// Smallest intensity whose cumulative count reaches `floor(total / 2)`
    pub median: usize,
}

impl HistogramStats {
    /// Compute the statistics of `bins`, where `bins[0]` holds intensity `offset`.
    pub fn on_interval(bins: &[u64], offset: usize) -> Self {
        let total: u64 = bins.iter().sum();
        if total == 0 {
            return Self {
                total,
                mean: f64::NAN,
                std_dev: f64::NAN,
                median: offset,
            };
        }

        let n = total as f64;
        let sum: f64 = bins
            .iter()
            .enumerate()
            .map(|(i, &c)| (offset + i) as f64 * c as f64)
            .sum();
        let mean = sum / n;
        let var: f64 = bins
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let d = (offset + i) as f64 - mean;
                d * d * c as f64
            })
            .sum::<f64>()
            / n;

        let half = total / 2;
        let mut cumulative = 0u64;
        let mut median = offset + bins.len() - 1;
        for (i, &c) in bins.iter().enumerate() {
            cumulative += c;
            if cumulative >= half {
                median = offset + i;
                break;
            }
        }

        Self {
            total,
            mean,
            std_dev: var.sqrt(),
            median,
        }
    }
}
