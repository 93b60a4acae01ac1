use crate::canvas::{mix, Canvas};
use log::debug;
use smoke_common::{cache, pixel_in_bounds, Particle};
use std::path::Path;

// Blend factor = intensity / divisor.
const CENTER_DIVISOR: f32 = 10.0;
const HALO_DIVISOR: f32 = 30.0;

/// Counters for one rendered cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Alive particles decoded from the cache.
    pub read: usize,
    /// Particles whose center pixel was inside the canvas.
    pub drawn: usize,
}

/// Composites the particles stored in `cache_path` onto `canvas`.
///
/// An absent or unreadable cache leaves the canvas untouched.
pub fn render_smoke<C: Canvas + ?Sized>(canvas: &mut C, cache_path: &Path, intensity: f32) -> RenderReport {
    let particles = cache::load(cache_path).into_population();
    let drawn = render_particles(canvas, &particles, intensity);
    debug!(
        "Rendered {} of {} particles from '{}'.",
        drawn,
        particles.len(),
        cache_path.display()
    );
    RenderReport { read: particles.len(), drawn }
}

/// Draws each alive particle as a gray dot with a one-pixel halo. Returns how
/// many particles were drawn.
pub fn render_particles<C: Canvas + ?Sized>(canvas: &mut C, particles: &[Particle], intensity: f32) -> usize {
    let center_factor = intensity / CENTER_DIVISOR;
    let halo_factor = intensity / HALO_DIVISOR;
    let mut drawn = 0;

    for particle in particles.iter().filter(|p| p.alive) {
        if !particle.pos.is_finite() {
            continue;
        }
        // Truncate toward zero, like a C integer cast.
        let x = particle.pos.x as i64;
        let y = particle.pos.y as i64;
        let value = particle.brightness();
        if !blend(canvas, x, y, value, center_factor) {
            continue;
        }

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx != 0 || dy != 0 {
                    blend(canvas, x + dx, y + dy, value, halo_factor);
                }
            }
        }
        drawn += 1;
    }
    drawn
}

/// Mixes gray `value` into the pixel at `(x, y)`. False when out of bounds.
fn blend<C: Canvas + ?Sized>(canvas: &mut C, x: i64, y: i64, value: u8, factor: f32) -> bool {
    let (width, height) = canvas.dimensions();
    if !pixel_in_bounds(width, height, x, y) {
        return false;
    }
    let (x, y) = (x as u32, y as u32);
    let original = canvas.get_rgb(x, y);
    canvas.put_rgb(x, y, mix(original, [value; 3], factor));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::FrameBuffer;
    use image::RgbImage;
    use smoke_common::{Vec2, MAX_AGE};

    fn speck(x: f32, y: f32, age: f32) -> Particle {
        Particle { alive: true, age, pos: Vec2::new(x, y), vel: Vec2::zero() }
    }

    fn changed_pixels(image: &RgbImage) -> usize {
        image.pixels().filter(|p| p.0 != [0, 0, 0]).count()
    }

    #[test]
    fn fresh_particle_at_full_intensity_draws_dot_and_halo() {
        let mut image = RgbImage::new(5, 5);
        let drawn = render_particles(&mut image, &[speck(2.5, 2.7, 0.0)], 10.0);

        assert_eq!(drawn, 1);
        assert_eq!(image.get_pixel(2, 2).0, [255, 255, 255]);
        for (x, y) in [(1, 1), (2, 1), (3, 1), (1, 2), (3, 2), (1, 3), (2, 3), (3, 3)] {
            assert_eq!(image.get_pixel(x, y).0, [85, 85, 85], "neighbour ({}, {})", x, y);
        }
        assert_eq!(changed_pixels(&image), 9);
    }

    #[test]
    fn halo_is_clipped_at_the_corner() {
        let mut image = RgbImage::new(4, 4);
        render_particles(&mut image, &[speck(0.2, 0.9, 0.0)], 10.0);
        assert_eq!(changed_pixels(&image), 4);
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [85, 85, 85]);
    }

    #[test]
    fn particle_outside_canvas_draws_nothing() {
        let mut image = RgbImage::new(4, 4);
        let particles = [speck(4.0, 1.0, 0.0), speck(-1.5, 1.0, 0.0), speck(f32::NAN, 1.0, 0.0)];
        assert_eq!(render_particles(&mut image, &particles, 10.0), 0);
        assert_eq!(changed_pixels(&image), 0);
    }

    #[test]
    fn dead_particles_are_skipped() {
        let mut image = RgbImage::new(4, 4);
        let mut dead = speck(1.0, 1.0, 0.0);
        dead.alive = false;
        assert_eq!(render_particles(&mut image, &[dead], 10.0), 0);
        assert_eq!(changed_pixels(&image), 0);
    }

    #[test]
    fn younger_particles_render_brighter() {
        let mut previous = u8::MAX;
        for age in [0.0, 0.5, 2.0, 3.0, 5.9, MAX_AGE] {
            let mut image = RgbImage::new(3, 3);
            render_particles(&mut image, &[speck(1.0, 1.0, age)], 10.0);
            let value = image.get_pixel(1, 1).0[0];
            assert!(value <= previous, "age {} rendered brighter", age);
            previous = value;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn partial_intensity_blends_toward_gray() {
        let mut image = RgbImage::from_pixel(3, 3, image::Rgb([100, 100, 100]));
        render_particles(&mut image, &[speck(1.0, 1.0, 0.0)], 5.0);
        // 100 * 0.5 + 255 * 0.5
        assert_eq!(image.get_pixel(1, 1).0, [178, 178, 178]);
    }

    #[test]
    fn renders_from_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.bin");
        let mut dead = speck(3.0, 3.0, 0.0);
        dead.alive = false;
        cache::store(&path, &[speck(1.0, 1.0, 0.0), dead, speck(10.0, 10.0, 0.0)]).unwrap();

        let mut image = RgbImage::new(6, 6);
        let report = render_smoke(&mut image, &path, 10.0);
        assert_eq!(report, RenderReport { read: 2, drawn: 1 });
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(3, 3).0, [0, 0, 0]);
    }

    #[test]
    fn missing_cache_leaves_canvas_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut image = RgbImage::from_pixel(3, 3, image::Rgb([9, 9, 9]));
        let report = render_smoke(&mut image, &dir.path().join("absent.bin"), 10.0);
        assert_eq!(report, RenderReport::default());
        assert!(image.pixels().all(|p| p.0 == [9, 9, 9]));
    }

    #[test]
    fn raw_frame_buffer_matches_image_canvas() {
        let particles = [speck(1.2, 0.5, 1.0), speck(3.9, 2.1, 4.0), speck(2.0, 2.0, 0.0)];

        let mut image = RgbImage::new(5, 4);
        render_particles(&mut image, &particles, 3.0);

        let mut bytes = vec![0u8; 5 * 4 * 3];
        let mut buffer = FrameBuffer::new(&mut bytes, 5, 4).unwrap();
        render_particles(&mut buffer, &particles, 3.0);

        assert_eq!(bytes, image.into_raw());
    }
}
