//! # Terrain Samplers
//!
//! The streaming core never decides which block occupies a coordinate. It asks a
//! [`TerrainSampler`], a pure function of `(seed, x, y, z)` that generation
//! workers call for every cell of a chunk. Samplers are shared between workers,
//! so they must be `Send + Sync` and must not rely on interior mutability for
//! their output.

use cgmath::Point3;
use noise::{NoiseFn, Perlin};

use super::{
    block::{block_type::BlockType, BlockId},
    chunk::{VoxelBuffer, CHUNK_DIMENSION},
};

/// A deterministic `sample(seed, x, y, z) -> BlockId` function.
///
/// Identical inputs must give identical outputs: a chunk that is unloaded and
/// later reloaded has to come back byte-identical.
pub trait TerrainSampler: Send + Sync {
    /// The block at world block coordinate `(x, y, z)` for `seed`.
    fn sample(&self, seed: u32, x: i32, y: i32, z: i32) -> BlockId;

    /// Fills `voxels` with the chunk whose minimum corner is the world block
    /// position `origin`.
    ///
    /// The default samples cell by cell. Samplers with per-seed setup override it
    /// so that setup happens once per chunk; the result must match `sample`.
    fn sample_chunk(&self, seed: u32, origin: Point3<i32>, voxels: &mut VoxelBuffer) {
        fill_chunk(origin, voxels, |x, y, z| self.sample(seed, x, y, z));
    }
}

/// Writes `sample(x, y, z)` into every cell, in world block coordinates.
fn fill_chunk(
    origin: Point3<i32>,
    voxels: &mut VoxelBuffer,
    mut sample: impl FnMut(i32, i32, i32) -> BlockId,
) {
    for z in 0..CHUNK_DIMENSION {
        for y in 0..CHUNK_DIMENSION {
            for x in 0..CHUNK_DIMENSION {
                let id = sample(origin.x + x, origin.y + y, origin.z + z);
                voxels.set(x as usize, y as usize, z as usize, id);
            }
        }
    }
}

impl<F> TerrainSampler for F
where
    F: Fn(u32, i32, i32, i32) -> BlockId + Send + Sync,
{
    fn sample(&self, seed: u32, x: i32, y: i32, z: i32) -> BlockId {
        self(seed, x, y, z)
    }
}

/// Flat ground: grass at `ground_height - 1`, three layers of dirt below it and
/// stone further down. Ignores the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatTerrain {
    /// First world `y` that is air.
    pub ground_height: i32,
}

impl FlatTerrain {
    /// Creates flat ground whose surface is at `ground_height`.
    pub fn new(ground_height: i32) -> Self {
        FlatTerrain { ground_height }
    }
}

impl TerrainSampler for FlatTerrain {
    fn sample(&self, _seed: u32, _x: i32, y: i32, _z: i32) -> BlockId {
        let depth = self.ground_height - 1 - y;
        let block = match depth {
            d if d < 0 => BlockType::Air,
            0 => BlockType::Grass,
            1..=3 => BlockType::Dirt,
            _ => BlockType::Stone,
        };
        block.id()
    }
}

/// Octaves summed for the height map.
const HEIGHT_OCTAVES: usize = 5;
/// Cave noise is sampled at this multiple of the height map frequency.
const CAVE_FREQUENCY_SCALE: f64 = 2.0;

/// Rolling hills from a Perlin height map, with sand beaches, water up to
/// `water_level` and noise caves below the surface.
#[derive(Debug, Clone)]
pub struct NoiseTerrain {
    seed: u32,
    perlin: Perlin,
    /// Highest surface height above `y = 0`.
    pub max_height: i32,
    /// Horizontal size of a noise feature, in blocks.
    pub scale: f64,
    /// Air at or below this height is water.
    pub water_level: i32,
    /// Cave noise, mapped to `[0, 1]`, above this carves air. Lower values mean
    /// more caves.
    pub cave_threshold: f64,
}

impl NoiseTerrain {
    /// Creates terrain with default shape parameters, prepared for `seed`.
    pub fn new(seed: u32) -> Self {
        let max_height = 32;
        NoiseTerrain {
            seed,
            perlin: Perlin::new(seed),
            max_height,
            scale: 30.0,
            water_level: max_height * 3 / 10,
            cave_threshold: 0.75,
        }
    }

    /// The seed whose noise is precomputed.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    fn height_at(perlin: &Perlin, scale: f64, max_height: i32, x: i32, z: i32) -> i32 {
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;
        for _ in 0..HEIGHT_OCTAVES {
            sum += perlin.get([
                x as f64 / scale * frequency,
                z as f64 / scale * frequency,
            ]) * amplitude;
            total += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        let normalized = (sum / total * 0.5 + 0.5).clamp(0.0, 1.0);
        (normalized * max_height as f64).floor() as i32
    }

    fn sample_with(&self, perlin: &Perlin, x: i32, y: i32, z: i32) -> BlockId {
        let height = Self::height_at(perlin, self.scale, self.max_height, x, z);

        if y > height {
            return if y <= self.water_level {
                BlockType::Water.id()
            } else {
                BlockType::Air.id()
            };
        }

        if y < height - 1 {
            let frequency = CAVE_FREQUENCY_SCALE / self.scale;
            let cave = perlin.get([x as f64 * frequency, y as f64 * frequency, z as f64 * frequency]);
            if cave * 0.5 + 0.5 > self.cave_threshold {
                return BlockType::Air.id();
            }
        }

        let block = if y == height {
            if height <= self.water_level + 1 {
                BlockType::Sand
            } else {
                BlockType::Grass
            }
        } else if y > height - 4 {
            BlockType::Dirt
        } else {
            BlockType::Stone
        };
        block.id()
    }
}

impl TerrainSampler for NoiseTerrain {
    fn sample(&self, seed: u32, x: i32, y: i32, z: i32) -> BlockId {
        if seed == self.seed {
            self.sample_with(&self.perlin, x, y, z)
        } else {
            self.sample_with(&Perlin::new(seed), x, y, z)
        }
    }

    fn sample_chunk(&self, seed: u32, origin: Point3<i32>, voxels: &mut VoxelBuffer) {
        let reseeded;
        let perlin = if seed == self.seed {
            &self.perlin
        } else {
            reseeded = Perlin::new(seed);
            &reseeded
        };
        fill_chunk(origin, voxels, |x, y, z| self.sample_with(perlin, x, y, z));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_samplers() {
        let sampler = |seed: u32, x: i32, _y: i32, _z: i32| (seed as i32 + x) as BlockId;
        assert_eq!(sampler.sample(2, 3, 0, 0), 5);
    }

    #[test]
    fn flat_terrain_layers() {
        let flat = FlatTerrain::new(10);
        assert_eq!(flat.sample(0, 0, 10, 0), BlockType::Air.id());
        assert_eq!(flat.sample(0, 0, 9, 0), BlockType::Grass.id());
        assert_eq!(flat.sample(0, 0, 8, 0), BlockType::Dirt.id());
        assert_eq!(flat.sample(0, 0, 6, 0), BlockType::Dirt.id());
        assert_eq!(flat.sample(0, 0, 5, 0), BlockType::Stone.id());
        assert_eq!(flat.sample(0, 0, -100, 0), BlockType::Stone.id());
    }

    #[test]
    fn noise_terrain_is_deterministic() {
        let terrain = NoiseTerrain::new(42);
        let other = NoiseTerrain::new(7);
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..500 {
            let (x, y, z) = (rng.i32(-500..500), rng.i32(-20..50), rng.i32(-500..500));
            assert_eq!(terrain.sample(42, x, y, z), terrain.sample(42, x, y, z));
            // A mismatched seed builds its own noise and still agrees with a
            // terrain prepared for that seed.
            assert_eq!(terrain.sample(7, x, y, z), other.sample(7, x, y, z));
        }
    }

    #[test]
    fn chunk_sampling_matches_cell_sampling() {
        let terrain = NoiseTerrain::new(42);
        let prepared = NoiseTerrain::new(9);
        let origin = Point3::new(-16, 0, 32);

        let mut own_seed = VoxelBuffer::empty();
        terrain.sample_chunk(42, origin, &mut own_seed);
        let mut reseeded = VoxelBuffer::empty();
        terrain.sample_chunk(9, origin, &mut reseeded);

        for z in 0..CHUNK_DIMENSION {
            for y in 0..CHUNK_DIMENSION {
                for x in 0..CHUNK_DIMENSION {
                    let (wx, wy, wz) = (origin.x + x, origin.y + y, origin.z + z);
                    let (lx, ly, lz) = (x as usize, y as usize, z as usize);
                    assert_eq!(own_seed.get(lx, ly, lz), terrain.sample(42, wx, wy, wz));
                    assert_eq!(reseeded.get(lx, ly, lz), prepared.sample(9, wx, wy, wz));
                }
            }
        }
    }

    #[test]
    fn noise_terrain_has_air_above_and_solid_below() {
        let terrain = NoiseTerrain::new(1);
        assert_eq!(terrain.sample(1, 12, terrain.max_height + 5, -3), BlockType::Air.id());
        assert_ne!(terrain.sample(1, 12, -200, -3), BlockType::Water.id());
    }
}
