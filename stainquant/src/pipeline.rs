//! Per-image pipeline
//!
//! Area mode: deconvolve, threshold channel 1, analyse particles and, with
//! a background threshold, measure channel 3. Histogram mode: deconvolve
//! and histogram every channel. [`Pipeline::threshold_masks`] stops after
//! thresholding, for checking threshold values against an image. Each
//! stage hands its typed result straight to the next.

use crate::config::{AnalysisConfig, threshold_u8};
use crate::error::{PipelineError, PipelineResult, StainResult};
use stainquant_color::{Deconvolver, threshold_upper};
use stainquant_core::Pix;
use stainquant_region::{ParticleOptions, analyze_particles};
use stainquant_report::{BackgroundArea, HistogramRecord, ImageResult, ParticleRow};

/// A decoded image with its identity and calibration.
#[derive(Debug, Clone)]
pub struct Image {
    /// Relative path within the batch
    pub identifier: String,
    /// RGB pixels
    pub pix: Pix,
    /// Physical size of one pixel
    pub pixel_size: f64,
}

/// Everything area mode extracts from one image.
#[derive(Debug, Clone)]
pub struct AreaOutcome {
    /// Summary row
    pub result: ImageResult,
    /// Per-particle rows in scan order
    pub particles: Vec<ParticleRow>,
    /// Union of the accepted particles
    pub union_mask: Pix,
    /// Channel 3 below the background threshold, when one is configured
    pub background_mask: Option<Pix>,
}

/// Channel masks at the configured thresholds.
#[derive(Debug, Clone)]
pub struct ThresholdMasks {
    /// Channel 1 at the stain threshold
    pub stain: Pix,
    /// Channel 3 at the background threshold
    pub background: Option<Pix>,
}

/// Per-image processing shared by every image of a batch.
#[derive(Debug, Clone)]
pub struct Pipeline {
    deconvolver: Deconvolver,
    stain_threshold: u8,
    background_threshold: Option<u8>,
    particle_options: ParticleOptions,
}

impl Pipeline {
    /// Build the pipeline for a validated configuration.
    pub fn new(config: &AnalysisConfig) -> StainResult<Self> {
        let background_threshold = match config.background_threshold {
            Some(t) => Some(threshold_u8("background threshold", t)?),
            None => None,
        };
        Ok(Self {
            deconvolver: Deconvolver::new(&config.stain_matrix()),
            stain_threshold: threshold_u8("stain threshold", config.stain_threshold)?,
            background_threshold,
            particle_options: config.particle_options(),
        })
    }

    /// Whether area results carry background columns.
    pub fn has_background(&self) -> bool {
        self.background_threshold.is_some()
    }

    /// Deconvolve one image and threshold channel 1 and, if configured,
    /// channel 3.
    pub fn threshold_masks(&self, image: &Image) -> PipelineResult<ThresholdMasks> {
        let [stain, _, background] = self.deconvolver.deconvolve(&image.pix)?;
        let stain = threshold_upper(&stain, self.stain_threshold)?;
        let background = match self.background_threshold {
            Some(t) => Some(threshold_upper(&background, t)?),
            None => None,
        };
        tracing::debug!(
            image = %image.identifier,
            stain = stain.count_pixels(),
            background = background.as_ref().map(Pix::count_pixels),
            "channels thresholded"
        );
        Ok(ThresholdMasks { stain, background })
    }

    /// Run area mode on one image.
    ///
    /// Returns `Ok(None)` when no particle is accepted.
    pub fn analyze_area(&self, image: &Image) -> PipelineResult<Option<AreaOutcome>> {
        let masks = self.threshold_masks(image)?;
        let analysis = analyze_particles(&masks.stain, Some(&image.pix), &self.particle_options)?;
        if analysis.is_empty() {
            return Ok(None);
        }
        let mask_stats = analysis
            .mask_stats
            .ok_or(PipelineError::Missing("particle mask statistics"))?;

        let ps = image.pixel_size;
        let background_area = masks.background.as_ref().map(|bg| {
            BackgroundArea::from_pixels(
                image.pix.pixel_count(),
                analysis.total_pixel_area(),
                bg.count_pixels(),
                ps,
            )
        });

        let particles = analysis
            .particles
            .iter()
            .map(|p| ParticleRow {
                identifier: image.identifier.clone(),
                index: p.index,
                area: p.scaled_area(ps),
                circularity: p.circularity,
                stats: p.stats,
                bounds: p.bounds,
            })
            .collect();

        let result = ImageResult {
            identifier: image.identifier.clone(),
            particle_count: analysis.count(),
            total_area: analysis.total_scaled_area(ps),
            mean_area: analysis.mean_scaled_area(ps),
            mask_stats,
            background: background_area,
        };
        Ok(Some(AreaOutcome {
            result,
            particles,
            union_mask: analysis.union_mask,
            background_mask: masks.background,
        }))
    }

    /// Run histogram mode on one image.
    pub fn analyze_histogram(&self, image: &Image) -> PipelineResult<HistogramRecord> {
        let channels = self.deconvolver.deconvolve(&image.pix)?;
        let mut histograms = Vec::with_capacity(channels.len());
        for ch in &channels {
            histograms.push(ch.gray_histogram()?);
        }
        Ok(HistogramRecord {
            identifier: image.identifier.clone(),
            channels: histograms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use stainquant_core::{PixelDepth, color};

    fn image(pix: Pix, pixel_size: f64) -> Image {
        Image {
            identifier: "t.png".to_string(),
            pix,
            pixel_size,
        }
    }

    fn white(w: u32, h: u32) -> Pix {
        Pix::new_filled(w, h, PixelDepth::Bit32, color::compose_rgb(255, 255, 255)).unwrap()
    }

    #[test]
    fn test_blank_image_is_skipped() {
        let config = AnalysisConfig::new(Mode::Area, std::env::temp_dir());
        let p = Pipeline::new(&config).unwrap();
        assert!(p.analyze_area(&image(white(8, 8), 1.0)).unwrap().is_none());
    }

    #[test]
    fn test_red_square() {
        let mut pm = white(10, 10).to_mut();
        for y in 3..5 {
            for x in 3..5 {
                pm.set_rgb(x, y, 200, 30, 40).unwrap();
            }
        }
        let config = AnalysisConfig::new(Mode::Area, std::env::temp_dir());
        let p = Pipeline::new(&config).unwrap();
        let out = p.analyze_area(&image(pm.into(), 2.0)).unwrap().unwrap();
        assert_eq!(out.result.particle_count, 1);
        assert_eq!(out.result.total_area, 16.0);
        assert_eq!(out.result.mask_stats.mean, 90.0);
        assert_eq!(out.particles.len(), 1);
        let bg = out.result.background.unwrap();
        assert_eq!(400.0, 16.0 + bg.background + bg.parenchyma);
    }

    #[test]
    fn test_threshold_masks() {
        let mut pm = white(6, 6).to_mut();
        pm.set_rgb(1, 1, 200, 30, 40).unwrap();
        pm.set_rgb(2, 1, 200, 30, 40).unwrap();
        let img = image(pm.into(), 1.0);

        let config = AnalysisConfig::new(Mode::Area, std::env::temp_dir());
        let masks = Pipeline::new(&config).unwrap().threshold_masks(&img).unwrap();
        assert_eq!(masks.stain.count_pixels(), 2);
        assert_eq!(masks.stain.get_pixel(1, 1), Some(1));
        assert_eq!(masks.background.unwrap().count_pixels(), 2);

        let config = AnalysisConfig {
            background_threshold: None,
            ..AnalysisConfig::new(Mode::Area, std::env::temp_dir())
        };
        let masks = Pipeline::new(&config).unwrap().threshold_masks(&img).unwrap();
        assert!(masks.background.is_none());
    }

    #[test]
    fn test_histogram_channels() {
        let config = AnalysisConfig::new(Mode::Histogram, std::env::temp_dir());
        let p = Pipeline::new(&config).unwrap();
        let rec = p.analyze_histogram(&image(white(4, 4), 1.0)).unwrap();
        assert_eq!(rec.channels.len(), 3);
        assert_eq!(rec.channels[0].count(255), 16);
    }
}
