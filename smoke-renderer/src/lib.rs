//! Compositing of cached smoke particles onto RGB frames.

pub mod canvas;
pub mod render;

pub use canvas::{mix, Canvas, FrameBuffer};
pub use render::{render_particles, render_smoke, RenderReport};
