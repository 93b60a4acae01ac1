use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use std::path::PathBuf;
use std::time::Instant;

mod random;
mod simulation;

use simulation::SmokeSimulation;
use smoke_common::SmokeConfig;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Smoke Engine...");

    // --- Load Configuration ---
    let config = SmokeConfig::load("config.toml")?;
    let params = config.frame_params()?;

    std::fs::create_dir_all(&config.output.cache_dir).with_context(|| {
        format!("Failed to create cache directory '{}'", config.output.cache_dir.display())
    })?;

    let mut sim = SmokeSimulation::new(params, config.smoke.seed);
    debug!("Frame Parameters: {:#?}", sim.params());
    if config.notes.is_empty() {
        warn!("No notes configured; every frame will be empty.");
    }

    let total_frames = config.video.total_frames;
    info!(
        "Simulating {} frames at {} fps ({}x{} px, {} notes).",
        total_frames,
        config.video.fps,
        config.video.width,
        config.video.height,
        config.notes.len()
    );

    let start_time = Instant::now();
    let mut previous_print_time = start_time;
    let mut previous_cache: Option<PathBuf> = None;
    let mut dropped_frames = 0u32;

    for frame in 0..total_frames {
        let notes = config.active_notes(frame);
        let output = config.cache_path(frame);

        let step_start_time = Instant::now();
        let report = sim.simulate_frame(&notes, previous_cache.as_deref(), &output);
        let step_duration = step_start_time.elapsed();

        if !report.written {
            dropped_frames += 1;
        }

        let print_interval_secs = 5.0;
        let should_print_status = previous_print_time.elapsed().as_secs_f64() >= print_interval_secs;
        let is_last_frame = frame + 1 == total_frames;
        if should_print_status || is_last_frame {
            info!(
                "Frame [{}/{}] | Notes: {} | Particles: {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                frame + 1,
                total_frames,
                notes.len(),
                report.alive,
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = Instant::now();
        } else {
            trace!(
                "Frame [{}/{}] completed in {:.2} ms",
                frame + 1,
                total_frames,
                step_duration.as_secs_f64() * 1000.0
            );
        }

        previous_cache = Some(output);
    }

    if dropped_frames > 0 {
        warn!("{} frames could not write their cache file.", dropped_frames);
    }
    info!(
        "Simulation finished in {:.3} seconds. Caches written to {}.",
        start_time.elapsed().as_secs_f64(),
        config.output.cache_dir.display()
    );
    Ok(())
}
