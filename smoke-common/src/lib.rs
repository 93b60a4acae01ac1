pub mod cache;
pub mod config;
pub mod particle;
pub mod sim_params;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use cache::CacheLoad;
pub use config::{NoteConfig, OutputConfig, SmokeConfig, SmokeParamsConfig, VideoConfig};
pub use particle::{in_bounds, pixel_in_bounds, Particle, AIR_RESIST, MAX_AGE};
pub use sim_params::{FrameParams, NoteSpan, VelocityBounds};
pub use vecmath::Vec2;
