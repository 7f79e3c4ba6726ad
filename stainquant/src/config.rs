//! Run configuration
//!
//! [`AnalysisConfig`] is the single record a batch run is built from. It
//! can be loaded from JSON, where every field is optional, and is checked
//! by [`AnalysisConfig::validate`] before any image is touched.

use crate::error::{StainError, StainResult};
use serde::{Deserialize, Serialize};
use stainquant_color::StainMatrix;
use stainquant_core::color::GrayWeighting;
use stainquant_region::{Connectivity, ParticleOptions};
use std::fs;
use std::path::{Path, PathBuf};

/// Default area-mode report name, relative to the working directory.
pub const AREA_OUTPUT: &str = "combined_measurements.csv";
/// Default histogram-mode report name, inside the input root.
pub const HISTOGRAM_OUTPUT: &str = "histograms.csv";

/// What a batch run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Particle areas and mask statistics per image
    #[default]
    Area,
    /// First-channel intensity histograms per image
    Histogram,
}

/// Configuration of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Report kind
    pub mode: Mode,
    /// Directory searched for images
    pub root: PathBuf,
    /// Report path; the mode's default when unset
    pub output: Option<PathBuf>,
    /// Stain vectors (rows R, G, B); the mode's preset when unset
    pub matrix: Option<[[f64; 3]; 3]>,
    /// Upper bound applied to channel 1 (0-255)
    pub stain_threshold: i32,
    /// Upper bound applied to channel 3; no background columns when unset
    pub background_threshold: Option<i32>,
    /// Physical size of one pixel
    pub pixel_size: f64,
    /// Smallest particle area in pixels
    pub min_size: u64,
    /// Largest particle area in pixels, unbounded when unset
    pub max_size: Option<u64>,
    /// Lowest accepted circularity (0-1)
    pub min_circularity: f64,
    /// Highest accepted circularity (0-1)
    pub max_circularity: f64,
    /// Join pixels by edges only
    pub four_connected: bool,
    /// Use 0.299/0.587/0.114 instead of the plain RGB mean
    pub weighted_gray: bool,
    /// Optional per-particle report
    pub particles_output: Option<PathBuf>,
    /// Optional directory for particle and threshold mask images
    pub mask_dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Area,
            root: PathBuf::new(),
            output: None,
            matrix: None,
            stain_threshold: 150,
            background_threshold: Some(150),
            pixel_size: 1.0,
            min_size: 0,
            max_size: None,
            min_circularity: 0.0,
            max_circularity: 1.0,
            four_connected: false,
            weighted_gray: false,
            particles_output: None,
            mask_dir: None,
        }
    }
}

impl AnalysisConfig {
    /// Defaults for `mode` over `root`.
    pub fn new<P: Into<PathBuf>>(mode: Mode, root: P) -> Self {
        Self {
            mode,
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`StainError::Config`] if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> StainResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| StainError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
            .map_err(|e| StainError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns [`StainError::Config`] describing the first invalid field.
    pub fn validate(&self) -> StainResult<()> {
        if !self.root.is_dir() {
            return Err(StainError::Config(format!(
                "input root {} is not a directory",
                self.root.display()
            )));
        }
        if !self.pixel_size.is_finite() || self.pixel_size <= 0.0 {
            return Err(StainError::Config(format!(
                "pixel size must be positive, got {}",
                self.pixel_size
            )));
        }
        threshold_u8("stain threshold", self.stain_threshold)?;
        if let Some(t) = self.background_threshold {
            threshold_u8("background threshold", t)?;
        }
        self.stain_matrix()
            .validate()
            .map_err(|e| StainError::Config(e.to_string()))?;
        self.particle_options()
            .validate()
            .map_err(|e| StainError::Config(e.to_string()))?;
        Ok(())
    }

    /// The configured matrix, or the preset for the mode.
    pub fn stain_matrix(&self) -> StainMatrix {
        match (self.matrix, self.mode) {
            (Some(rows), _) => StainMatrix::new(rows),
            (None, Mode::Area) => StainMatrix::OIL_RED_O,
            (None, Mode::Histogram) => StainMatrix::PAS,
        }
    }

    /// The report path, or the mode's default.
    pub fn output_path(&self) -> PathBuf {
        match (&self.output, self.mode) {
            (Some(p), _) => p.clone(),
            (None, Mode::Area) => PathBuf::from(AREA_OUTPUT),
            (None, Mode::Histogram) => self.root.join(HISTOGRAM_OUTPUT),
        }
    }

    /// Gray conversion for RGB intensity sampling.
    pub fn weighting(&self) -> GrayWeighting {
        if self.weighted_gray {
            GrayWeighting::Weighted
        } else {
            GrayWeighting::Unweighted
        }
    }

    /// Particle filters; per-particle intensities only when a particle
    /// report is requested.
    pub fn particle_options(&self) -> ParticleOptions {
        ParticleOptions {
            min_size: self.min_size,
            max_size: self.max_size,
            min_circularity: self.min_circularity,
            max_circularity: self.max_circularity,
            connectivity: if self.four_connected {
                Connectivity::Four
            } else {
                Connectivity::Eight
            },
            measure_intensity: self.particles_output.is_some(),
            weighting: self.weighting(),
        }
    }
}

/// Check a threshold and narrow it to a byte.
pub(crate) fn threshold_u8(name: &str, value: i32) -> StainResult<u8> {
    u8::try_from(value).map_err(|_| {
        StainError::Config(format!("{} must be within 0..=255, got {}", name, value))
    })
}
