use crate::particle::AIR_RESIST;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Velocity range per axis. Units depend on context: pixels per second in the
/// configuration, pixels per frame once converted into [`FrameParams`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityBounds {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl VelocityBounds {
    /// Divides every bound by `fps`.
    pub fn per_frame(&self, fps: f32) -> Self {
        VelocityBounds {
            x_min: self.x_min / fps,
            x_max: self.x_max / fps,
            y_min: self.y_min / fps,
            y_max: self.y_max / fps,
        }
    }

    fn is_finite(&self) -> bool {
        [self.x_min, self.x_max, self.y_min, self.y_max].iter().all(|v| v.is_finite())
    }
}

/// Horizontal spawn range of one sounding note, `[x_start, x_end)` in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSpan {
    pub x_start: f32,
    pub x_end: f32,
}

impl NoteSpan {
    pub fn new(x_start: f32, x_end: f32) -> Self {
        NoteSpan { x_start, x_end }
    }
}

/// Per-frame simulation parameters derived once from the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameParams {
    // Video
    pub fps: f32,
    pub width: u32,
    pub height: u32,

    // Spawning
    pub num_new_per_note: u32,
    pub y_start: f32,
    pub velocity: VelocityBounds, // pixels per frame

    // Physics
    pub drag: f32,     // AIR_RESIST^(1/fps), applied once per frame
    pub age_step: f32, // seconds per frame
}

impl FrameParams {
    /// Builds frame parameters from velocity bounds given in pixels per second.
    pub fn new(
        fps: f32,
        width: u32,
        height: u32,
        num_new_per_note: u32,
        y_start: f32,
        velocity_per_second: VelocityBounds,
    ) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            anyhow::bail!("fps must be a positive finite number, got {}.", fps);
        }
        if width == 0 || height == 0 {
            anyhow::bail!("Image dimensions must be non-zero, got {}x{}.", width, height);
        }
        if !y_start.is_finite() {
            anyhow::bail!("y_start must be finite.");
        }
        if !velocity_per_second.is_finite() {
            anyhow::bail!("Velocity bounds must be finite: {:?}.", velocity_per_second);
        }

        Ok(FrameParams {
            fps,
            width,
            height,
            num_new_per_note,
            y_start,
            velocity: velocity_per_second.per_frame(fps),
            drag: AIR_RESIST.powf(1.0 / fps),
            age_step: 1.0 / fps,
        })
    }
}
