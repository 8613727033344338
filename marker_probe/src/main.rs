// marker_probe: finds red-bordered rectangles in images and reports the color at
// each rectangle's center. Three modes mirror the ways swatch strips get read:
// cluster detection, a scanline cut through one row, and fixed-cell sampling.
// A fourth mode redraws an image using the palette read from a swatch strip.

mod render;
mod settings;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use marker_vision::core_modules::palette::{Background, ChannelWeights, Quantizer, quantize_grid};
use marker_vision::core_modules::row_regions::row_regions;
use marker_vision::core_modules::uniform_grid::sample_uniform;
use marker_vision::parallel_pipeline::WorkerPool;
use marker_vision::pipeline::MarkerPipeline;
use marker_vision::{ColorSample, PixelGrid, RedThreshold, SampleSource};
use settings::Settings;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Settings file (TOML, JSON or YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect marker-bordered rectangles and sample their centers.
    Clusters(ClusterArgs),
    /// Split one row into regions of similar color, skipping marker pixels.
    Row(RowArgs),
    /// Sample the centers of equally sized cells along the x axis.
    Uniform(UniformArgs),
    /// Redraw an image with the palette found in a swatch image.
    Quantize(QuantizeArgs),
}

#[derive(Args, Debug)]
struct MarkerArgs {
    /// Use the strict red definition (R >= 250, G and B <= 20).
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct ClusterArgs {
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    marker: MarkerArgs,

    #[arg(long)]
    gap_threshold: Option<u32>,

    #[arg(long)]
    internal_gap_threshold: Option<u32>,

    #[arg(long)]
    wide_threshold: Option<u32>,

    #[arg(long)]
    min_group_size: Option<usize>,

    /// Radius of the neighborhood sampled around each center.
    #[arg(long)]
    radius: Option<u32>,

    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Args, Debug)]
struct RowArgs {
    image: PathBuf,

    /// Row to scan. Defaults to the middle row.
    #[arg(long)]
    y: Option<u32>,

    #[arg(long)]
    tolerance: Option<u16>,

    #[command(flatten)]
    marker: MarkerArgs,
}

#[derive(Args, Debug)]
struct UniformArgs {
    image: PathBuf,

    #[arg(long)]
    count: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum WeightPreset {
    Human,
    Balanced,
    Green,
}

impl From<WeightPreset> for ChannelWeights {
    fn from(preset: WeightPreset) -> Self {
        match preset {
            WeightPreset::Human => ChannelWeights::HUMAN,
            WeightPreset::Balanced => ChannelWeights::BALANCED,
            WeightPreset::Green => ChannelWeights::GREEN,
        }
    }
}

#[derive(Args, Debug)]
struct QuantizeArgs {
    image: PathBuf,

    /// Image holding the red-bordered swatches that define the palette.
    #[arg(long)]
    swatches: PathBuf,

    /// Where to write the quantized PNG.
    #[arg(long, short)]
    output: PathBuf,

    /// Channel weight preset. Overrides the configured weights.
    #[arg(long, value_enum)]
    weights: Option<WeightPreset>,

    /// Background color as `R,G,B`. Matching pixels become transparent.
    #[arg(long, value_parser = parse_rgb)]
    background: Option<ColorSample>,

    /// Values above 1.0 favour the background over palette colors.
    #[arg(long, default_value_t = 1.0)]
    background_preference: f64,

    #[command(flatten)]
    marker: MarkerArgs,
}

fn parse_rgb(value: &str) -> std::result::Result<ColorSample, String> {
    let channels = value
        .split(',')
        .map(|part| part.trim().parse::<u8>().map_err(|err| format!("`{part}`: {err}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match channels[..] {
        [red, green, blue] => Ok(ColorSample::new(red, green, blue)),
        _ => Err(format!("expected three channels, got {}", channels.len())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "settings loaded");

    match cli.command {
        Command::Clusters(args) => {
            resolve_cluster_settings(&mut settings, &args)?;
            run_clusters(&settings, &args.images, cli.json).await
        }
        Command::Row(args) => {
            if args.marker.strict {
                settings.pipeline.marker = RedThreshold::STRICT;
            }
            let tolerance = args.tolerance.unwrap_or(settings.row_tolerance);
            run_row(&settings, &args.image, args.y, tolerance, cli.json)
        }
        Command::Uniform(args) => run_uniform(&args.image, args.count, cli.json),
        Command::Quantize(args) => {
            if args.marker.strict {
                settings.pipeline.marker = RedThreshold::STRICT;
            }
            if let Some(preset) = args.weights {
                settings.weights = preset.into();
            }
            settings
                .pipeline
                .validate()
                .context("invalid pipeline settings")?;
            run_quantize(&settings, &args)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_cluster_overrides(settings: &mut Settings, args: &ClusterArgs) {
    let clustering = &mut settings.pipeline.clustering;
    if let Some(gap) = args.gap_threshold {
        clustering.gap_threshold = gap;
    }
    if let Some(gap) = args.internal_gap_threshold {
        clustering.internal_gap_threshold = gap;
    }
    if let Some(wide) = args.wide_threshold {
        clustering.wide_threshold = wide;
    }
    if let Some(size) = args.min_group_size {
        clustering.min_group_size = size;
    }
    if let Some(radius) = args.radius {
        settings.pipeline.neighborhood_radius = radius;
    }
    if args.marker.strict {
        settings.pipeline.marker = RedThreshold::STRICT;
    }
    if args.workers.is_some() {
        settings.workers = args.workers;
    }
}

/// Applies the command-line layer and validates the final pipeline config.
fn resolve_cluster_settings(settings: &mut Settings, args: &ClusterArgs) -> Result<()> {
    apply_cluster_overrides(settings, args);
    settings
        .pipeline
        .validate()
        .context("invalid pipeline settings")
}

fn load_grid(path: &Path) -> Result<PixelGrid> {
    let image = image::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let grid = PixelGrid::from(&image);
    info!(path = %path.display(), width = grid.width(), height = grid.height(), "image loaded");
    Ok(grid)
}

async fn run_clusters(settings: &Settings, paths: &[PathBuf], json: bool) -> Result<()> {
    let grids = paths
        .iter()
        .map(|path| load_grid(path))
        .collect::<Result<Vec<_>>>()?;

    let pool = match settings.workers {
        Some(workers) => WorkerPool::with_workers(settings.pipeline, workers),
        None => WorkerPool::new(settings.pipeline),
    }
    .context("failed to start worker pool")?;
    debug!(workers = pool.worker_count(), "worker pool started");

    let results = pool.process_all(grids).await;
    pool.shutdown().await;

    let mut reports = Vec::with_capacity(results.len());
    for (path, result) in paths.iter().zip(results) {
        let report = result.with_context(|| format!("analysis of {} failed", path.display()))?;
        reports.push((path.as_path(), report));
    }

    if json {
        println!("{}", render::reports_json(&reports)?);
    } else {
        for (path, report) in &reports {
            print!("{}", render::ReportText { path: *path, report });
        }
    }
    Ok(())
}

fn run_row(settings: &Settings, path: &Path, y: Option<u32>, tolerance: u16, json: bool) -> Result<()> {
    let grid = load_grid(path)?;
    if grid.is_empty() {
        bail!("{} has no pixels", path.display());
    }
    let y = y.unwrap_or(grid.height() / 2);
    let regions = row_regions(&grid, y, &settings.pipeline.marker, tolerance)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&regions)?);
    } else {
        print!("{}", render::RegionsText { path, y, regions: &regions });
    }
    Ok(())
}

fn run_uniform(path: &Path, count: u32, json: bool) -> Result<()> {
    let grid = load_grid(path)?;
    let samples = sample_uniform(&grid, count)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&render::uniform_json(&samples))?);
    } else {
        print!("{}", render::UniformText { path, samples: &samples });
    }
    Ok(())
}

fn run_quantize(settings: &Settings, args: &QuantizeArgs) -> Result<()> {
    let swatches = load_grid(&args.swatches)?;
    let report = MarkerPipeline::new(settings.pipeline)?.analyze(&swatches);
    let palette: Vec<ColorSample> = report
        .rectangles
        .iter()
        .filter_map(|rectangle| rectangle.sample.color)
        .collect();
    if palette.is_empty() {
        bail!("no swatches found in {}", args.swatches.display());
    }
    info!(colors = palette.len(), "palette extracted");

    let mut quantizer = Quantizer::new(palette, settings.weights)?;
    if let Some(color) = args.background {
        quantizer = quantizer.with_background(Background {
            color,
            preference: args.background_preference,
        })?;
    }

    let grid = load_grid(&args.image)?;
    let quantized = quantize_grid(&grid, &quantizer);
    info!(background = quantized.background_count(), "image quantized");

    let output = image::RgbaImage::from_fn(grid.width(), grid.height(), |x, y| {
        let [red, green, blue] = quantized.grid.sample(x, y).to_array();
        let alpha = if quantized.is_background(x, y) { 0 } else { 255 };
        image::Rgba([red, green, blue, alpha])
    });
    output
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("Quantized image saved to {}", args.output.display());
    Ok(())
}
