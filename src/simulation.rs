use crate::random::UniformSource;
use log::{debug, trace, warn};
use rand::prelude::*;
use smoke_common::cache;
use smoke_common::{in_bounds, FrameParams, NoteSpan, Particle, Vec2, MAX_AGE};
use std::path::Path;

/// Counters describing one simulated frame. Used for logging and tests only;
/// failures never surface as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Alive particles read from the input cache.
    pub loaded: usize,
    /// Particles spawned for the active notes this frame.
    pub spawned: usize,
    /// Particles that left the image this frame.
    pub culled_out_of_bounds: usize,
    /// Particles that exceeded `MAX_AGE` before this frame.
    pub culled_by_age: usize,
    /// Particles still alive after the step.
    pub alive: usize,
    /// Whether the output cache was written.
    pub written: bool,
}

/// What happened to a particle during one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Survived,
    OutOfBounds,
    Expired,
}

/// Advances one particle by a single frame.
///
/// The position always moves by the current velocity. A particle that ends up
/// outside the image, or was already older than `MAX_AGE`, is marked dead and
/// keeps its velocity and age; otherwise drag is applied and it ages by one
/// frame.
pub fn step_particle(particle: &mut Particle, params: &FrameParams) -> StepOutcome {
    particle.pos += particle.vel;

    if !in_bounds(params.width, params.height, particle.pos.x, particle.pos.y) {
        particle.alive = false;
        return StepOutcome::OutOfBounds;
    }
    if particle.age > MAX_AGE {
        particle.alive = false;
        return StepOutcome::Expired;
    }

    particle.vel *= params.drag;
    particle.age += params.age_step;
    StepOutcome::Survived
}

/// Appends `num_new_per_note` fresh particles for every note in `notes`.
/// Returns how many were spawned.
pub fn spawn_particles<U: UniformSource + ?Sized>(
    particles: &mut Vec<Particle>,
    notes: &[NoteSpan],
    params: &FrameParams,
    rng: &mut U,
) -> usize {
    let per_note = params.num_new_per_note as usize;
    particles.reserve(notes.len() * per_note);

    let v = params.velocity;
    for note in notes {
        for _ in 0..per_note {
            let pos = Vec2::new(rng.uniform(note.x_start, note.x_end), params.y_start);
            let vel = Vec2::new(rng.uniform(v.x_min, v.x_max), rng.uniform(v.y_min, v.y_max));
            particles.push(Particle::spawn(pos, vel));
        }
    }
    notes.len() * per_note
}

/// Steps the whole population in place, tallying culled and surviving
/// particles into `report`.
fn advance_population(particles: &mut [Particle], params: &FrameParams, report: &mut FrameReport) {
    for particle in particles.iter_mut() {
        match step_particle(particle, params) {
            StepOutcome::Survived => report.alive += 1,
            StepOutcome::OutOfBounds => report.culled_out_of_bounds += 1,
            StepOutcome::Expired => report.culled_by_age += 1,
        }
    }
}

/// Runs the smoke simulation one frame at a time, chaining frames through
/// cache files.
pub struct SmokeSimulation {
    /// Parameters derived from the configuration.
    pub params: FrameParams,
    /// RNG for spawn positions and velocities.
    pub rng: StdRng,
    /// Number of frames simulated so far.
    pub current_frame: u32,
}

impl SmokeSimulation {
    /// Creates a simulation. A fixed `seed` makes spawns reproducible.
    pub fn new(params: FrameParams, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { params, rng, current_frame: 0 }
    }

    pub fn params(&self) -> &FrameParams {
        &self.params
    }

    /// Simulates one frame.
    ///
    /// Loads the population from `input` (`None` or an empty path means there
    /// is no previous frame), spawns particles for `notes`, steps everything
    /// once and writes the result to `output`. Dead particles are written too;
    /// the next read drops them. A missing input or unwritable output is
    /// logged and otherwise ignored.
    pub fn simulate_frame(&mut self, notes: &[NoteSpan], input: Option<&Path>, output: &Path) -> FrameReport {
        let mut report = FrameReport::default();

        let mut particles = match input.filter(|path| !path.as_os_str().is_empty()) {
            Some(path) => cache::load(path).into_population(),
            None => Vec::new(),
        };
        report.loaded = particles.len();

        report.spawned = spawn_particles(&mut particles, notes, &self.params, &mut self.rng);

        advance_population(&mut particles, &self.params, &mut report);

        match cache::store(output, &particles) {
            Ok(()) => report.written = true,
            Err(e) => warn!("Dropping frame {} output: {:#}", self.current_frame, e),
        }

        trace!(
            "Frame {}: loaded {}, spawned {}, left image {}, expired {}, alive {}.",
            self.current_frame,
            report.loaded,
            report.spawned,
            report.culled_out_of_bounds,
            report.culled_by_age,
            report.alive
        );
        if !report.written {
            debug!("Frame {} produced no cache; the next frame starts empty.", self.current_frame);
        }

        self.current_frame += 1;
        report
    }
}
