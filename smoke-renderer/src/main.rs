use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use image::{Rgb, RgbImage};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use smoke_renderer::render_smoke;

/// Command-line arguments for the smoke renderer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Particle cache files (.bin) to render, one output image each
    #[arg(required = true)]
    caches: Vec<PathBuf>,

    /// Directory the PNG frames are written to
    #[arg(short, long, default_value = "smoke_frames")]
    output_dir: PathBuf,

    /// Width of the output frames in pixels (ignored with --background)
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Height of the output frames in pixels (ignored with --background)
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Optional image to draw the smoke on top of
    #[arg(long)]
    background: Option<PathBuf>,

    /// Background color name, used when no background image is given
    /// (black, white, red, green, blue, yellow, cyan, magenta)
    #[arg(long, default_value = "black")]
    bg_color: String,

    /// Smoke intensity multiplier; 10 draws fresh particles at full white
    #[arg(long, default_value_t = 1.0)]
    intensity: f32,
}

// Color definitions for named colors (RGB format)
const COLOR_MAP: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
];

/// Parse a color name to RGB values
fn parse_color(color_name: &str) -> [u8; 3] {
    for &(name, color) in COLOR_MAP {
        if name.eq_ignore_ascii_case(color_name) {
            return color;
        }
    }
    // Default to black if color not found
    warn!("Color '{}' not recognized, using black.", color_name);
    [0, 0, 0]
}

/// Loads the background image or fills a blank one.
fn background_frame(args: &Args) -> Result<RgbImage> {
    match &args.background {
        Some(path) => {
            let image = image::open(path)
                .with_context(|| format!("Failed to open background image: {}", path.display()))?;
            Ok(image.to_rgb8())
        }
        None => {
            if args.width == 0 || args.height == 0 {
                anyhow::bail!("Frame dimensions must be non-zero, got {}x{}.", args.width, args.height);
            }
            Ok(RgbImage::from_pixel(args.width, args.height, Rgb(parse_color(&args.bg_color))))
        }
    }
}

/// Output PNG path for a cache file: same stem, in `output_dir`.
fn frame_path(output_dir: &Path, cache: &Path) -> PathBuf {
    let stem = cache
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("frame"));
    output_dir.join(format!("{}.png", stem))
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    Builder::from_default_env().filter(None, LevelFilter::Info).init();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    info!("Starting Smoke Renderer...");
    info!("Cache files: {}", args.caches.len());
    info!("Output directory: {}", args.output_dir.display());
    info!("Intensity: {}", args.intensity);

    if !args.intensity.is_finite() || args.intensity < 0.0 {
        anyhow::bail!("Intensity must be a non-negative finite number, got {}.", args.intensity);
    }

    let background = background_frame(&args)?;
    info!("Frame dimensions: {}x{} px", background.width(), background.height());

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory: {}", args.output_dir.display()))?;

    // Set up progress bar
    let progress_bar = ProgressBar::new(args.caches.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")?
            .progress_chars("#>-"),
    );

    let start_time = Instant::now();
    let mut total_drawn = 0usize;
    let mut empty_frames = 0usize;

    for cache in &args.caches {
        let mut frame = background.clone();
        let report = render_smoke(&mut frame, cache, args.intensity);
        if report.read == 0 {
            empty_frames += 1;
        }
        total_drawn += report.drawn;

        let output = frame_path(&args.output_dir, cache);
        frame
            .save(&output)
            .with_context(|| format!("Failed to write frame: {}", output.display()))?;
        progress_bar.inc(1);
    }

    progress_bar.finish_with_message(format!("Rendered {} frames", args.caches.len()));

    if empty_frames > 0 {
        warn!("{} frames had no smoke particles.", empty_frames);
    }
    let duration = start_time.elapsed();
    info!(
        "Rendered {} frames ({} particles drawn) in {:.2?}",
        args.caches.len(),
        total_drawn,
        duration
    );
    Ok(())
}
