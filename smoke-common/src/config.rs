use crate::sim_params::{FrameParams, NoteSpan, VelocityBounds};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Video settings shared by the simulator and the renderer
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VideoConfig {
    pub fps: f32,
    pub width: u32,
    pub height: u32,
    pub total_frames: u32,
}

// Smoke spawning and drawing parameters, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SmokeParamsConfig {
    pub num_new_per_note: u32,
    pub y_start: f32,
    // Pixels per second
    pub x_vel_min: f32,
    pub x_vel_max: f32,
    pub y_vel_min: f32,
    pub y_vel_max: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default)]
    pub seed: Option<u64>,
}

// Where cache files are written
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub cache_dir: PathBuf,
    pub base_filename: String,
}

/// A note that emits smoke while `start_frame <= frame < end_frame`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NoteConfig {
    pub x_start: f32,
    pub x_end: f32,
    pub start_frame: u32,
    pub end_frame: u32,
}

// Main configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SmokeConfig {
    pub video: VideoConfig,
    pub smoke: SmokeParamsConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub notes: Vec<NoteConfig>,
}

fn default_intensity() -> f32 {
    1.0
}

impl SmokeConfig {
    /// Loads the smoke configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {:#}", path_ref.display(), e))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SmokeConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        // Checks fps, dimensions and velocity bounds.
        self.frame_params()?;

        if !self.smoke.intensity.is_finite() || self.smoke.intensity < 0.0 {
            anyhow::bail!("intensity must be a non-negative finite number.");
        }
        if self.output.base_filename.is_empty() {
            anyhow::bail!("base_filename must not be empty.");
        }
        for (i, note) in self.notes.iter().enumerate() {
            if !(note.x_start.is_finite() && note.x_end.is_finite()) || note.x_start > note.x_end {
                anyhow::bail!("Note {} has an invalid x range [{}, {}).", i, note.x_start, note.x_end);
            }
            if note.start_frame > note.end_frame {
                anyhow::bail!("Note {} ends (frame {}) before it starts (frame {}).", i, note.end_frame, note.start_frame);
            }
        }
        Ok(())
    }

    /// Velocity bounds as configured, in pixels per second.
    pub fn velocity_per_second(&self) -> VelocityBounds {
        VelocityBounds {
            x_min: self.smoke.x_vel_min,
            x_max: self.smoke.x_vel_max,
            y_min: self.smoke.y_vel_min,
            y_max: self.smoke.y_vel_max,
        }
    }

    /// Converts the configuration into the per-frame parameters used by the simulator.
    pub fn frame_params(&self) -> Result<FrameParams> {
        FrameParams::new(
            self.video.fps,
            self.video.width,
            self.video.height,
            self.smoke.num_new_per_note,
            self.smoke.y_start,
            self.velocity_per_second(),
        )
    }

    /// Spawn ranges of the notes sounding at `frame`.
    pub fn active_notes(&self, frame: u32) -> Vec<NoteSpan> {
        self.notes
            .iter()
            .filter(|note| note.start_frame <= frame && frame < note.end_frame)
            .map(|note| NoteSpan::new(note.x_start, note.x_end))
            .collect()
    }

    /// Cache file written by the simulator for `frame`.
    pub fn cache_path(&self, frame: u32) -> PathBuf {
        self.output
            .cache_dir
            .join(format!("{}_{:05}.bin", self.output.base_filename, frame))
    }
}
