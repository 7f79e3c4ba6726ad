//! stainquant CLI - batch stain quantification over a directory of images.

use clap::{Args, Parser, Subcommand};
use stainquant::color::StainMatrix;
use stainquant::{AnalysisConfig, BatchDriver, BatchSummary, Mode, preview_thresholds};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "stainquant")]
#[command(about = "Quantify stained particles and stain histograms across a folder of micrographs")]
#[command(version)]
struct Cli {
    /// Log per-stage details (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure particle areas per image into one CSV table.
    Area(AreaArgs),

    /// Accumulate channel-1 histograms per image into one CSV table.
    Histogram(HistogramArgs),

    /// Write the stain and background threshold masks of one image.
    Preview(PreviewArgs),

    /// Print the built-in stain matrices.
    Presets,
}

#[derive(Debug, Clone, Args)]
struct MatrixArgs {
    /// Stain matrix as nine comma-separated values, row by row.
    #[arg(long, value_delimiter = ',', conflicts_with = "preset")]
    matrix: Option<Vec<f64>>,

    /// Named stain matrix (see `stainquant presets`).
    #[arg(long)]
    preset: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct ThresholdArgs {
    /// Upper bound on channel 1 for stained pixels (0-255).
    #[arg(long)]
    stain_threshold: Option<i32>,

    /// Upper bound on channel 3 for background pixels (0-255).
    #[arg(long, conflicts_with = "no_background")]
    background_threshold: Option<i32>,

    /// Skip the background channel.
    #[arg(long)]
    no_background: bool,
}

#[derive(Debug, Clone, Args)]
struct CommonArgs {
    /// Directory searched recursively for tif/tiff/jpg/jpeg/png files.
    root: PathBuf,

    /// Report path (default depends on the mode).
    #[arg(long)]
    out: Option<PathBuf>,

    /// JSON configuration file; command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    stains: MatrixArgs,
}

#[derive(Debug, Clone, Args)]
struct AreaArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    thresholds: ThresholdArgs,

    /// Physical size of one pixel.
    #[arg(long)]
    pixel_size: Option<f64>,

    /// Smallest particle area in pixels.
    #[arg(long)]
    min_size: Option<u64>,

    /// Largest particle area in pixels.
    #[arg(long)]
    max_size: Option<u64>,

    /// Lowest accepted circularity.
    #[arg(long)]
    min_circularity: Option<f64>,

    /// Highest accepted circularity.
    #[arg(long)]
    max_circularity: Option<f64>,

    /// Join pixels by edges only (default: edges and corners).
    #[arg(long)]
    four_connected: bool,

    /// Use 0.299/0.587/0.114 weights for RGB intensities.
    #[arg(long)]
    weighted_gray: bool,

    /// Write one row per particle to this CSV file.
    #[arg(long)]
    particles: Option<PathBuf>,

    /// Write particle and background masks as PNG files into this directory.
    #[arg(long)]
    masks: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct PreviewArgs {
    /// Image to threshold.
    image: PathBuf,

    /// Directory receiving Stain_<name>.png and Background_<name>.png.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// JSON configuration file; command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    stains: MatrixArgs,

    #[command(flatten)]
    thresholds: ThresholdArgs,
}

#[derive(Debug, Clone, Args)]
struct HistogramArgs {
    #[command(flatten)]
    common: CommonArgs,
}

impl MatrixArgs {
    fn apply(&self, config: &mut AnalysisConfig) -> CliResult<()> {
        if let Some(values) = &self.matrix {
            config.matrix = Some(*StainMatrix::from_slice(values)?.rows());
        }
        if let Some(name) = &self.preset {
            let m = StainMatrix::preset(name)
                .ok_or_else(|| -> CliError { format!("unknown stain preset '{}'", name).into() })?;
            config.matrix = Some(*m.rows());
        }
        Ok(())
    }
}

impl ThresholdArgs {
    fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(t) = self.stain_threshold {
            config.stain_threshold = t;
        }
        if let Some(t) = self.background_threshold {
            config.background_threshold = Some(t);
        }
        if self.no_background {
            config.background_threshold = None;
        }
    }
}

fn load_config(path: Option<&PathBuf>, mode: Mode, root: &Path) -> CliResult<AnalysisConfig> {
    let mut config = match path {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::new(mode, root),
    };
    config.mode = mode;
    config.root = root.to_path_buf();
    Ok(config)
}

impl CommonArgs {
    fn to_config(&self, mode: Mode) -> CliResult<AnalysisConfig> {
        let mut config = load_config(self.config.as_ref(), mode, &self.root)?;
        if let Some(out) = &self.out {
            config.output = Some(out.clone());
        }
        self.stains.apply(&mut config)?;
        Ok(config)
    }
}

impl AreaArgs {
    fn to_config(&self) -> CliResult<AnalysisConfig> {
        let mut config = self.common.to_config(Mode::Area)?;
        self.thresholds.apply(&mut config);
        if let Some(ps) = self.pixel_size {
            config.pixel_size = ps;
        }
        if let Some(v) = self.min_size {
            config.min_size = v;
        }
        if self.max_size.is_some() {
            config.max_size = self.max_size;
        }
        if let Some(v) = self.min_circularity {
            config.min_circularity = v;
        }
        if let Some(v) = self.max_circularity {
            config.max_circularity = v;
        }
        config.four_connected |= self.four_connected;
        config.weighted_gray |= self.weighted_gray;
        if self.particles.is_some() {
            config.particles_output = self.particles.clone();
        }
        if self.masks.is_some() {
            config.mask_dir = self.masks.clone();
        }
        Ok(config)
    }
}

impl PreviewArgs {
    fn run(&self) -> CliResult<()> {
        let root = match self.image.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut config = load_config(self.config.as_ref(), Mode::Area, root)?;
        self.stains.apply(&mut config)?;
        self.thresholds.apply(&mut config);
        for path in preview_thresholds(&config, &self.image, &self.out_dir)? {
            tracing::info!("Written: {}", path.display());
        }
        Ok(())
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Area(args) => run(args.to_config()?),
        Commands::Histogram(args) => run(args.common.to_config(Mode::Histogram)?),
        Commands::Preview(args) => args.run(),
        Commands::Presets => {
            print_presets();
            Ok(())
        }
    }
}

fn run(config: AnalysisConfig) -> CliResult<()> {
    let driver = BatchDriver::new(config)?;
    let summary = driver.run()?;
    report_summary(&summary);
    Ok(())
}

fn report_summary(summary: &BatchSummary) {
    for path in &summary.written {
        tracing::info!("Written: {}", path.display());
    }
    if summary.failed > 0 {
        tracing::warn!("{} image(s) could not be processed", summary.failed);
    }
}

fn print_presets() {
    for (name, m) in StainMatrix::PRESETS {
        println!("{}:", name);
        for row in m.rows() {
            println!("  {:>12.6} {:>12.6} {:>12.6}", row[0], row[1], row[2]);
        }
    }
}
