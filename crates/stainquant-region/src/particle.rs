//! Particle analysis
//!
//! Labels the foreground of a mask, measures each component (area, traced
//! perimeter, circularity, bounds), drops components outside the size and
//! circularity ranges, and optionally samples an intensity image inside
//! each accepted particle and inside their union. The union is the input
//! mask with the rejected components cleared: `!(!mask | rejected)`.

use crate::conncomp::{Connectivity, label_components};
use crate::contour::{circularity, trace_outline, traced_perimeter};
use crate::{RegionError, RegionResult};
use stainquant_core::color::GrayWeighting;
use stainquant_core::pix::statistics::IntensityAccumulator;
use stainquant_core::{Box, IntensityStats, Pix, PixelDepth};

/// Filters and measurements for [`analyze_particles`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleOptions {
    /// Smallest accepted area in pixels (inclusive)
    pub min_size: u64,
    /// Largest accepted area in pixels (inclusive); `None` is unbounded
    pub max_size: Option<u64>,
    /// Lowest accepted circularity (inclusive)
    pub min_circularity: f64,
    /// Highest accepted circularity (inclusive)
    pub max_circularity: f64,
    /// Pixel adjacency
    pub connectivity: Connectivity,
    /// Compute per-particle intensity statistics
    pub measure_intensity: bool,
    /// Gray conversion for RGB intensity images
    pub weighting: GrayWeighting,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            min_size: 0,
            max_size: None,
            min_circularity: 0.0,
            max_circularity: 1.0,
            connectivity: Connectivity::Eight,
            measure_intensity: false,
            weighting: GrayWeighting::Unweighted,
        }
    }
}

impl ParticleOptions {
    /// Check that the ranges are well formed.
    pub fn validate(&self) -> RegionResult<()> {
        if let Some(max) = self.max_size
            && max < self.min_size
        {
            return Err(RegionError::InvalidParameters(format!(
                "size range is inverted: {} > {}",
                self.min_size, max
            )));
        }
        let (lo, hi) = (self.min_circularity, self.max_circularity);
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
            return Err(RegionError::InvalidParameters(format!(
                "circularity range must lie in 0..=1 with min <= max: {}..{}",
                lo, hi
            )));
        }
        Ok(())
    }

    fn accepts(&self, area: u64, circ: f64) -> bool {
        area >= self.min_size
            && self.max_size.is_none_or(|max| area <= max)
            && circ >= self.min_circularity
            && circ <= self.max_circularity
    }
}

/// One accepted particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// 1-based position among accepted particles, in scan order
    pub index: u32,
    /// Area in pixels
    pub area: u64,
    /// Traced perimeter in pixel units
    pub perimeter: f64,
    /// `4π·area / perimeter²`, at most 1
    pub circularity: f64,
    /// Bounding box
    pub bounds: Box,
    /// Intensity statistics of the sampled image inside the particle
    pub stats: Option<IntensityStats>,
}

impl Particle {
    /// Area in physical units: `area × pixel_size²`.
    pub fn scaled_area(&self, pixel_size: f64) -> f64 {
        self.area as f64 * pixel_size * pixel_size
    }
}

/// Result of [`analyze_particles`] for one mask.
#[derive(Debug, Clone)]
pub struct ParticleAnalysis {
    /// Accepted particles in scan order
    pub particles: Vec<Particle>,
    /// 1 bpp union of the accepted particles
    pub union_mask: Pix,
    /// Intensity statistics of the sampled image over `union_mask`
    pub mask_stats: Option<IntensityStats>,
}

impl ParticleAnalysis {
    /// Number of accepted particles.
    pub fn count(&self) -> usize {
        self.particles.len()
    }

    /// True when no particle was accepted.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Sum of accepted particle areas in pixels.
    pub fn total_pixel_area(&self) -> u64 {
        self.particles.iter().map(|p| p.area).sum()
    }

    /// Sum of `area × pixel_size²` over the accepted particles.
    pub fn total_scaled_area(&self, pixel_size: f64) -> f64 {
        self.particles
            .iter()
            .map(|p| p.scaled_area(pixel_size))
            .sum()
    }

    /// Mean scaled particle area, 0 when there is no particle.
    pub fn mean_scaled_area(&self, pixel_size: f64) -> f64 {
        if self.particles.is_empty() {
            return 0.0;
        }
        self.total_scaled_area(pixel_size) / self.particles.len() as f64
    }
}

/// Detect and measure the particles of a 1 bpp `mask`.
///
/// `image`, when given, must have the size of the mask and be 8, 16 or
/// 32 bpp; it is sampled for the union mask statistics and, with
/// `measure_intensity`, for each particle.
///
/// # Errors
///
/// Returns an error for a non-binary mask, an invalid option range, or an
/// intensity image of the wrong size or depth.
pub fn analyze_particles(
    mask: &Pix,
    image: Option<&Pix>,
    options: &ParticleOptions,
) -> RegionResult<ParticleAnalysis> {
    options.validate()?;
    if let Some(img) = image {
        if img.depth() == PixelDepth::Bit1 {
            return Err(RegionError::UnsupportedDepth {
                expected: "8, 16 or 32 bpp",
                actual: 1,
            });
        }
        mask.check_same_size(img)?;
    }

    let labels = label_components(mask, options.connectivity)?;
    let mut rejected = Pix::new(mask.width(), mask.height(), PixelDepth::Bit1)?.to_mut();
    let mut any_rejected = false;
    let mut particles = Vec::new();

    for component in labels.components() {
        let outline = trace_outline(&labels, component, options.connectivity);
        let perimeter = traced_perimeter(&outline);
        let circ = circularity(component.area, perimeter);
        let b = component.bounds;
        if !options.accepts(component.area, circ) {
            tracing::trace!(
                label = component.label,
                area = component.area,
                circularity = circ,
                "particle rejected"
            );
            for y in b.y..b.bottom() {
                for x in b.x..b.right() {
                    if labels.get(x as i64, y as i64) == component.label {
                        rejected.set_pixel_unchecked(x as u32, y as u32, 1);
                    }
                }
            }
            any_rejected = true;
            continue;
        }

        let mut acc = IntensityAccumulator::new();
        if options.measure_intensity
            && let Some(img) = image
        {
            for y in b.y..b.bottom() {
                for x in b.x..b.right() {
                    if labels.get(x as i64, y as i64) != component.label {
                        continue;
                    }
                    if let Some(v) = img.intensity_at(x as u32, y as u32, options.weighting) {
                        acc.push(v);
                    }
                }
            }
        }

        particles.push(Particle {
            index: particles.len() as u32 + 1,
            area: component.area,
            perimeter,
            circularity: circ,
            bounds: b,
            stats: acc.finish(),
        });
    }

    let union_mask = if any_rejected {
        let rejected: Pix = rejected.into();
        mask.invert()?.or(&rejected)?.invert()?
    } else {
        mask.clone()
    };
    let mask_stats = match image {
        Some(img) if !particles.is_empty() => {
            img.intensity_stats_masked(&union_mask, options.weighting)?
        }
        _ => None,
    };

    tracing::debug!(
        components = labels.len(),
        accepted = particles.len(),
        "particle analysis done"
    );

    Ok(ParticleAnalysis {
        particles,
        union_mask,
        mask_stats,
    })
}
