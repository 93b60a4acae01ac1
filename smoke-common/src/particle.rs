use crate::vecmath::Vec2;
use serde::{Deserialize, Serialize};

/// Particle lifetime ceiling in seconds. Older particles are culled.
pub const MAX_AGE: f32 = 6.0;

/// Fraction of velocity kept after one second of drag.
pub const AIR_RESIST: f32 = 0.95;

/// One smoke speck.
///
/// Field order is the on-disk record order (see [`crate::cache`]); do not
/// reorder fields without bumping the cache layout.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Whether the record should be kept when the cache is read back.
    pub alive: bool,
    /// Seconds since the particle was spawned.
    pub age: f32,
    /// Position in pixels.
    pub pos: Vec2,
    /// Velocity in pixels per frame.
    pub vel: Vec2,
}

impl Particle {
    /// A freshly spawned particle: alive, age zero.
    pub fn spawn(pos: Vec2, vel: Vec2) -> Self {
        Particle { alive: true, age: 0.0, pos, vel }
    }

    /// Brightness of this particle as a gray level, fading linearly from 255
    /// at age zero to 0 at `MAX_AGE`.
    pub fn brightness(&self) -> u8 {
        let value = 255.0 * (1.0 - self.age / MAX_AGE);
        // NaN maps to 0 through the saturating cast.
        value.clamp(0.0, 255.0) as u8
    }
}

impl Default for Particle {
    fn default() -> Self {
        Particle::spawn(Vec2::zero(), Vec2::zero())
    }
}

/// True when `(x, y)` lies inside `[0, width) x [0, height)`. NaN is outside.
#[inline]
pub fn in_bounds(width: u32, height: u32, x: f32, y: f32) -> bool {
    x >= 0.0 && x < width as f32 && y >= 0.0 && y < height as f32
}

/// Integer form of [`in_bounds`] for pixel coordinates.
#[inline]
pub fn pixel_in_bounds(width: u32, height: u32, x: i64, y: i64) -> bool {
    x >= 0 && x < width as i64 && y >= 0 && y < height as i64
}
