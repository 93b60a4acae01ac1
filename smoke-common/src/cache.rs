//! Binary particle cache shared between consecutive simulator frames and the
//! renderer.
//!
//! Layout: a `u32` record count followed by that many particle records. Every
//! value uses bincode's fixed-width little-endian encoding, so a record is
//! `alive: u8 | age: f32 | x: f32 | y: f32 | vx: f32 | vy: f32` (21 bytes)
//! regardless of platform.

use crate::particle::Particle;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Size in bytes of the count header.
pub const HEADER_SIZE: usize = 4;

/// Size in bytes of one encoded particle record.
pub const RECORD_SIZE: usize = 21;

// Upper bound on the up-front allocation; a corrupt header must not be able to
// request gigabytes before a single record is read.
const MAX_RESERVE: usize = 1_000_000;

/// Outcome of loading a cache file from disk.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLoad {
    /// The header was read; holds every alive record that could be decoded.
    Loaded(Vec<Particle>),
    /// No file exists at the path. Expected on the first frame.
    NotFound,
    /// The file exists but could not be opened or has no readable header.
    Unreadable,
}

impl CacheLoad {
    /// The loaded population, or an empty one for `NotFound`/`Unreadable`.
    pub fn into_population(self) -> Vec<Particle> {
        match self {
            CacheLoad::Loaded(particles) => particles,
            CacheLoad::NotFound | CacheLoad::Unreadable => Vec::new(),
        }
    }
}

/// Decodes a particle population from `reader`.
///
/// Fails only when the count header cannot be read. A stream that ends or
/// turns corrupt part-way through yields the records decoded so far. Records
/// that are not alive are dropped.
pub fn decode<R: Read>(mut reader: R) -> Result<Vec<Particle>> {
    let count: u32 = bincode::deserialize_from(&mut reader)
        .context("Failed to read particle count from cache header")?;

    let mut particles = Vec::with_capacity((count as usize).min(MAX_RESERVE));
    let mut dead = 0usize;
    for index in 0..count {
        match bincode::deserialize_from::<_, Particle>(&mut reader) {
            Ok(particle) if particle.alive => particles.push(particle),
            Ok(_) => dead += 1,
            Err(e) => {
                warn!(
                    "Particle cache broke off at record {} of {}: {}. Keeping {} particles.",
                    index,
                    count,
                    e,
                    particles.len()
                );
                break;
            }
        }
    }

    debug!(
        "Decoded {} particles ({} dead records skipped, header count {}).",
        particles.len(),
        dead,
        count
    );
    Ok(particles)
}

/// Encodes `particles` to `writer` in order. Liveness is not filtered.
pub fn encode<W: Write>(particles: &[Particle], mut writer: W) -> Result<()> {
    let count = u32::try_from(particles.len())
        .context("Particle population does not fit in a u32 cache header")?;
    bincode::serialize_into(&mut writer, &count).context("Failed to write cache header")?;
    for particle in particles {
        bincode::serialize_into(&mut writer, particle).context("Failed to write particle record")?;
    }
    writer.flush().context("Failed to flush particle cache")?;
    Ok(())
}

/// Opens and decodes the cache at `path`, logging a warning when it is absent
/// or unreadable.
pub fn load(path: &Path) -> CacheLoad {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("No particle cache at '{}'. Using an empty population.", path.display());
            return CacheLoad::NotFound;
        }
        Err(e) => {
            warn!("Cannot read particle cache '{}': {}. Using an empty population.", path.display(), e);
            return CacheLoad::Unreadable;
        }
    };

    match decode(BufReader::new(file)) {
        Ok(particles) => CacheLoad::Loaded(particles),
        Err(e) => {
            warn!("Cannot read particle cache '{}': {:#}. Using an empty population.", path.display(), e);
            CacheLoad::Unreadable
        }
    }
}

/// Creates (or truncates) the cache at `path` and writes `particles` to it.
pub fn store(path: &Path, particles: &[Particle]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create particle cache '{}'", path.display()))?;
    encode(particles, BufWriter::new(file))
        .with_context(|| format!("Failed to write particle cache '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vecmath::Vec2;

    fn sample(n: usize) -> Vec<Particle> {
        (0..n)
            .map(|i| Particle {
                alive: true,
                age: i as f32 * 0.25,
                pos: Vec2::new(10.0 + i as f32, 5.5),
                vel: Vec2::new(-0.5, 1.0 / (i as f32 + 1.0)),
            })
            .collect()
    }

    fn encoded(particles: &[Particle]) -> Vec<u8> {
        let mut bytes = Vec::new();
        encode(particles, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn record_size_matches_bincode() {
        let size = bincode::serialized_size(&Particle::default()).unwrap();
        assert_eq!(size as usize, RECORD_SIZE);
        assert_eq!(encoded(&sample(2)).len(), HEADER_SIZE + 2 * RECORD_SIZE);
    }

    #[test]
    fn layout_is_little_endian_in_field_order() {
        let particle = Particle {
            alive: true,
            age: 1.5,
            pos: Vec2::new(2.0, 3.0),
            vel: Vec2::new(-4.0, 0.5),
        };
        let bytes = encoded(&[particle]);

        assert_eq!(&bytes[0..4], &1u32.to_le_bytes());
        assert_eq!(bytes[4], 1);
        assert_eq!(&bytes[5..9], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[9..13], &2.0f32.to_le_bytes());
        assert_eq!(&bytes[13..17], &3.0f32.to_le_bytes());
        assert_eq!(&bytes[17..21], &(-4.0f32).to_le_bytes());
        assert_eq!(&bytes[21..25], &0.5f32.to_le_bytes());
    }

    #[test]
    fn round_trip_preserves_population() {
        for n in [0, 1, 17] {
            let particles = sample(n);
            let decoded = decode(encoded(&particles).as_slice()).unwrap();
            assert_eq!(decoded, particles);
        }
    }

    #[test]
    fn decode_drops_dead_records() {
        let mut particles = sample(4);
        particles[1].alive = false;
        particles[3].alive = false;

        let bytes = encoded(&particles);
        assert_eq!(bytes.len(), HEADER_SIZE + 4 * RECORD_SIZE, "encode must not filter");

        let decoded = decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, vec![particles[0], particles[2]]);
    }

    #[test]
    fn truncated_stream_yields_partial_population() {
        let particles = sample(3);
        let mut bytes = encoded(&particles);
        bytes.truncate(HEADER_SIZE + 2 * RECORD_SIZE + 7);

        let decoded = decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, particles[..2].to_vec());
    }

    #[test]
    fn corrupt_alive_flag_stops_decoding() {
        let particles = sample(3);
        let mut bytes = encoded(&particles);
        bytes[HEADER_SIZE + RECORD_SIZE] = 7;

        let decoded = decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, particles[..1].to_vec());
    }

    #[test]
    fn missing_header_is_an_error() {
        assert!(decode(&b""[..]).is_err());
        assert!(decode(&[1u8, 0][..]).is_err());
    }

    #[test]
    fn load_distinguishes_missing_and_unreadable() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.bin");
        assert_eq!(load(&missing), CacheLoad::NotFound);

        let empty = dir.path().join("empty.bin");
        std::fs::write(&empty, b"").unwrap();
        assert_eq!(load(&empty), CacheLoad::Unreadable);
        assert!(load(&empty).into_population().is_empty());
    }

    #[test]
    fn store_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.bin");
        let particles = sample(5);

        store(&path, &particles).unwrap();
        assert_eq!(load(&path), CacheLoad::Loaded(particles));

        store(&path, &[]).unwrap();
        assert_eq!(load(&path), CacheLoad::Loaded(Vec::new()));
    }

    #[test]
    fn store_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("frame.bin");
        assert!(store(&path, &sample(1)).is_err());
    }
}
