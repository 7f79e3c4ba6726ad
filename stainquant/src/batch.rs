//! Batch driver
//!
//! Walks the input root, runs the pipeline on one image at a time and
//! feeds the rows to the reports, which are written once at the end. A
//! failure on one image is logged and counted; it never stops the batch.

use crate::config::{AnalysisConfig, Mode};
use crate::error::{StainError, StainResult};
use crate::pipeline::{Image, Pipeline};
use stainquant_core::ImageFormat;
use stainquant_io::{ImageSource, SourceEntry};
use stainquant_report::{AreaReport, HistogramReport, ParticleReport, Reporter};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Counters and outputs of a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Image files found under the root
    pub discovered: usize,
    /// Images that produced a row
    pub processed: usize,
    /// Images without any accepted particle (area mode)
    pub skipped_empty: usize,
    /// Images that failed to decode or process
    pub failed: usize,
    /// Files written, reports first
    pub written: Vec<PathBuf>,
}

/// Runs one configured batch.
#[derive(Debug)]
pub struct BatchDriver {
    config: AnalysisConfig,
    pipeline: Pipeline,
}

impl BatchDriver {
    /// Validate `config` and prepare the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`StainError::Config`] if the configuration is invalid.
    pub fn new(config: AnalysisConfig) -> StainResult<Self> {
        config.validate()?;
        let pipeline = Pipeline::new(&config)?;
        Ok(Self { config, pipeline })
    }

    /// The configuration this driver runs with.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Process every image under the root and write the reports.
    ///
    /// # Errors
    ///
    /// Returns an error only for a missing root or a failed output write.
    pub fn run(&self) -> StainResult<BatchSummary> {
        let source = ImageSource::new(&self.config.root)
            .map_err(|e| StainError::Config(e.to_string()))?;
        info!(
            root = %self.config.root.display(),
            mode = ?self.config.mode,
            "starting batch"
        );

        let summary = match self.config.mode {
            Mode::Area => self.run_area(source)?,
            Mode::Histogram => self.run_histogram(source)?,
        };

        if summary.written.is_empty() {
            info!("no output produced");
        }
        info!(
            discovered = summary.discovered,
            processed = summary.processed,
            skipped_empty = summary.skipped_empty,
            failed = summary.failed,
            "batch finished"
        );
        Ok(summary)
    }

    fn run_area(&self, source: ImageSource) -> StainResult<BatchSummary> {
        let mut summary = BatchSummary::default();
        let mut report = AreaReport::new(self.pipeline.has_background());
        let mut particles = self.config.particles_output.as_ref().map(|_| ParticleReport::new());
        let mut mask_names = MaskNames::default();

        for entry in source {
            summary.discovered += 1;
            let Some(image) = self.load(&entry, &mut summary)? else {
                continue;
            };

            let outcome = match self.pipeline.analyze_area(&image) {
                Ok(Some(outcome)) => outcome,
                Ok(None) => {
                    info!(image = %image.identifier, "no particles, skipped");
                    summary.skipped_empty += 1;
                    continue;
                }
                Err(e) => {
                    skip_failed(&image.identifier, e.into(), &mut summary)?;
                    continue;
                }
            };

            if let Some(dir) = &self.config.mask_dir {
                let stem = mask_names.assign(&image.identifier);
                let path = dir.join(format!("Mask_{}.png", stem));
                write_mask(&outcome.union_mask, &path)?;
                summary.written.push(path);
                if let Some(bg) = &outcome.background_mask {
                    let path = dir.join(format!("Background_{}.png", stem));
                    write_mask(bg, &path)?;
                    summary.written.push(path);
                }
            }
            info!(
                image = %image.identifier,
                particles = outcome.result.particle_count,
                area = outcome.result.total_area,
                "processed"
            );
            report.append(outcome.result)?;
            if let Some(p) = particles.as_mut() {
                for row in outcome.particles {
                    p.append(row)?;
                }
            }
            summary.processed += 1;
        }

        let mut written = Vec::new();
        if let Some(path) = report.finalize(&self.config.output_path())? {
            written.push(path);
        }
        if let (Some(p), Some(path)) = (particles, &self.config.particles_output)
            && let Some(path) = p.finalize(path)?
        {
            written.push(path);
        }
        written.append(&mut summary.written);
        summary.written = written;
        Ok(summary)
    }

    fn run_histogram(&self, source: ImageSource) -> StainResult<BatchSummary> {
        let mut summary = BatchSummary::default();
        let mut report = HistogramReport::new();

        for entry in source {
            summary.discovered += 1;
            let Some(image) = self.load(&entry, &mut summary)? else {
                continue;
            };
            match self.pipeline.analyze_histogram(&image) {
                Ok(record) => {
                    report.append(record)?;
                    info!(image = %image.identifier, "processed");
                    summary.processed += 1;
                }
                Err(e) => skip_failed(&image.identifier, e.into(), &mut summary)?,
            }
        }

        if let Some(path) = report.finalize(&self.config.output_path())? {
            summary.written.push(path);
        }
        Ok(summary)
    }

    /// Decode one entry; a failure is logged and counted.
    fn load(&self, entry: &SourceEntry, summary: &mut BatchSummary) -> StainResult<Option<Image>> {
        match entry.read_rgb() {
            Ok(pix) => {
                debug!(
                    image = %entry.identifier,
                    width = pix.width(),
                    height = pix.height(),
                    "decoded"
                );
                Ok(Some(Image {
                    identifier: entry.identifier.clone(),
                    pix,
                    pixel_size: self.config.pixel_size,
                }))
            }
            Err(e) => {
                skip_failed(&entry.identifier, StainError::Decode(e), summary)?;
                Ok(None)
            }
        }
    }
}

/// Log and count an error confined to one image; anything else aborts.
fn skip_failed(identifier: &str, err: StainError, summary: &mut BatchSummary) -> StainResult<()> {
    if !err.is_per_item() {
        return Err(err);
    }
    warn!(image = %identifier, error = %err, "skipped");
    summary.failed += 1;
    Ok(())
}

/// Hands out mask file stems that are unique within one batch.
///
/// The stem is the identifier with `/` turned into `_`, extension kept. A
/// stem already handed out gets a `_2`, `_3`, ... suffix.
#[derive(Debug, Default)]
pub struct MaskNames {
    used: HashSet<String>,
}

impl MaskNames {
    /// Stem for the masks of `identifier`.
    pub fn assign(&mut self, identifier: &str) -> String {
        let base = identifier.replace('/', "_");
        let mut stem = base.clone();
        let mut n = 1;
        while !self.used.insert(stem.clone()) {
            n += 1;
            stem = format!("{}_{}", base, n);
        }
        stem
    }
}

/// Write the threshold masks of a single image into `out_dir` as
/// `Stain_<name>.png` and, with a background threshold,
/// `Background_<name>.png`.
///
/// # Errors
///
/// Unlike a batch, a decode or pipeline failure is returned.
pub fn preview_thresholds(
    config: &AnalysisConfig,
    image_path: &Path,
    out_dir: &Path,
) -> StainResult<Vec<PathBuf>> {
    config.validate()?;
    let pipeline = Pipeline::new(config)?;
    let name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| StainError::Config(format!("{} is not a file", image_path.display())))?;
    let image = Image {
        pix: stainquant_io::read_image_rgb(image_path)?,
        identifier: name,
        pixel_size: config.pixel_size,
    };

    let masks = pipeline.threshold_masks(&image)?;
    let mut written = Vec::new();
    let path = out_dir.join(format!("Stain_{}.png", image.identifier));
    write_mask(&masks.stain, &path)?;
    written.push(path);
    if let Some(bg) = &masks.background {
        let path = out_dir.join(format!("Background_{}.png", image.identifier));
        write_mask(bg, &path)?;
        written.push(path);
    }
    info!(image = %image.identifier, outputs = written.len(), "threshold masks written");
    Ok(written)
}

fn write_mask(mask: &stainquant_core::Pix, path: &Path) -> StainResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    stainquant_io::write_image(mask, path, ImageFormat::Png).map_err(|source| {
        StainError::MaskWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}
