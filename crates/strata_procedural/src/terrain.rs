//! # Terrain Generator
//!
//! Turns a chunk coordinate into a voxel grid.
//!
//! Per column:
//! 1. Domain-warp the world position and sample the biome field
//! 2. Sum six height octaves (256 down to 8 blocks) at the unwarped position
//! 3. Scale by the blended biome height factor
//! 4. Fill rock / soil / surface / water / air
//!
//! Vegetation runs as a second pass so later columns never overwrite
//! the canopy of an earlier tree.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::biome::{pick_biome, ColumnBiome};
use crate::chunk::{Block, ChunkCoord, ChunkDims, VoxelGrid};
use crate::noise::{NoiseSources, WorldSeed};

/// Terrain shaping parameters.
///
/// Heights are fractions of the chunk height so the same config works
/// for any `size_y`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// World seed.
    pub seed: u64,
    /// Water fills empty space up to this fraction of `size_y`.
    pub sea_level: f64,
    /// Maximum base height as a fraction of `size_y`.
    pub max_terrain_height: f64,
    /// Wavelength of the warp field in blocks.
    pub warp_scale: f64,
    /// Displacement in blocks at full warp strength.
    pub warp_amp: f64,
    /// Per-column probability of a tree in vegetated biomes.
    pub tree_chance: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default().value(),
            sea_level: 0.3,
            max_terrain_height: 0.6,
            warp_scale: 100.0,
            warp_amp: 20.0,
            tree_chance: 0.02,
        }
    }
}

/// Height and biome resolved for one world column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSample {
    /// Blended biome of the column.
    pub biome: ColumnBiome,
    /// Y of the surface block, in `[0, size_y)`.
    pub final_height: usize,
}

/// Chunk generator using injected noise sources.
pub struct TerrainGenerator {
    dims: ChunkDims,
    config: TerrainConfig,
    noise: NoiseSources,
    seed: WorldSeed,
}

impl TerrainGenerator {
    /// Biome field wavelength in blocks.
    const BIOME_SCALE: f64 = 300.0;
    /// Wavelength of the first height octave.
    const BASE_OCTAVE_SCALE: f64 = 256.0;
    /// Height octaves (256, 128, 64, 32, 16, 8).
    const OCTAVES: u32 = 6;
    /// Soil layers between the surface and rock.
    const SOIL_DEPTH: i64 = 4;
    /// Shortest trunk.
    const TREE_MIN_HEIGHT: usize = 4;
    /// Random extra trunk height, exclusive.
    const TREE_EXTRA_HEIGHT: usize = 3;
    /// Canopy sphere radius.
    const LEAF_RADIUS: i64 = 3;
    /// Seed purpose for the vegetation stream.
    const TREE_PURPOSE: u64 = 0x7EE5;

    /// Creates a generator with noise derived from `config.seed`.
    #[must_use]
    pub fn new(dims: ChunkDims, config: TerrainConfig) -> Self {
        let seed = WorldSeed::new(config.seed);
        Self::with_noise(dims, config, NoiseSources::from_seed(seed))
    }

    /// Creates a generator around caller-supplied noise sources.
    #[must_use]
    pub fn with_noise(dims: ChunkDims, config: TerrainConfig, noise: NoiseSources) -> Self {
        Self {
            dims,
            config,
            noise,
            seed: WorldSeed::new(config.seed),
        }
    }

    /// Chunk dimensions this generator produces.
    #[inline]
    #[must_use]
    pub const fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// Sea level in blocks.
    #[inline]
    #[must_use]
    pub fn sea_level(&self) -> usize {
        (self.config.sea_level * self.dims.size_y as f64) as usize
    }

    /// Maximum base terrain height in blocks.
    #[inline]
    #[must_use]
    pub fn max_terrain_height(&self) -> usize {
        (self.config.max_terrain_height * self.dims.size_y as f64) as usize
    }

    /// Resolves biome and surface height of a world column.
    #[must_use]
    pub fn column(&self, world_x: i32, world_z: i32) -> ColumnSample {
        let wx = f64::from(world_x);
        let wz = f64::from(world_z);

        // Warp only bends biome borders; height uses the raw position
        let warp = self.noise.warp.sample(wx / self.config.warp_scale, wz / self.config.warp_scale)
            * self.config.warp_amp;
        let warped_x = wx + warp;
        let warped_z = wz - warp;
        let biome = pick_biome(
            self.noise
                .biome
                .sample(warped_x / Self::BIOME_SCALE, warped_z / Self::BIOME_SCALE),
        );

        let total = self.noise.terrain.octaved(
            wx / Self::BASE_OCTAVE_SCALE,
            wz / Self::BASE_OCTAVE_SCALE,
            Self::OCTAVES,
            0.5,
            2.0,
        );
        let norm = ((total + 1.0) / 2.0).clamp(0.0, 1.0);
        let base_height = (norm * self.max_terrain_height() as f64) as i64;
        let final_height = (base_height as f64 * biome.height_factor(norm)) as i64;
        let top = self.dims.size_y as i64 - 1;

        ColumnSample {
            biome,
            final_height: final_height.clamp(0, top.max(0)) as usize,
        }
    }

    /// Generates the voxels of a chunk.
    ///
    /// Pure: the same coordinate always yields the same grid.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord) -> VoxelGrid {
        let dims = self.dims;
        let mut grid = VoxelGrid::new(dims);
        let mut columns = Vec::with_capacity(dims.size_x * dims.size_z);

        let origin_x = coord.world_x(dims);
        let origin_z = coord.world_z(dims);

        // Pass 1: Column fill
        for z in 0..dims.size_z {
            for x in 0..dims.size_x {
                let sample = self.column(origin_x + x as i32, origin_z + z as i32);
                self.fill_column(&mut grid, x, z, &sample);
                columns.push(sample);
            }
        }

        // Pass 2: Vegetation
        let mut rng = ChaCha8Rng::seed_from_u64(self.chunk_seed(coord).value());
        let sea_level = self.sea_level();
        for z in 0..dims.size_z {
            for x in 0..dims.size_x {
                let sample = columns[x + z * dims.size_x];
                let h = sample.final_height;
                if !sample.biome.has_trees() || h < sea_level || h + 1 >= dims.size_y {
                    continue;
                }
                if rng.gen::<f64>() < self.config.tree_chance {
                    let trunk = Self::TREE_MIN_HEIGHT + rng.gen_range(0..Self::TREE_EXTRA_HEIGHT);
                    Self::place_tree(&mut grid, x, h + 1, z, trunk);
                }
            }
        }

        grid
    }

    fn fill_column(&self, grid: &mut VoxelGrid, x: usize, z: usize, sample: &ColumnSample) {
        let fh = sample.final_height as i64;
        let sea_level = self.sea_level() as i64;

        for y in 0..self.dims.size_y {
            let yy = y as i64;
            let block = if yy < fh - Self::SOIL_DEPTH {
                Block::ROCK
            } else if yy < fh {
                sample.biome.params.soil
            } else if yy == fh {
                sample.biome.params.surface
            } else if yy <= sea_level {
                Block::WATER
            } else {
                Block::AIR
            };
            grid.set(x, y, z, block);
        }
    }

    /// Trunk from `base_y` upward, canopy sphere centered on the trunk top.
    fn place_tree(grid: &mut VoxelGrid, x: usize, base_y: usize, z: usize, trunk_height: usize) {
        let size_y = grid.dims().size_y;
        for y in base_y..(base_y + trunk_height).min(size_y) {
            grid.set(x, y, z, Block::TRUNK);
        }

        let top = (base_y + trunk_height) as i64;
        let r = Self::LEAF_RADIUS;
        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    if dx * dx + dy * dy + dz * dz > r * r {
                        continue;
                    }
                    let (nx, ny, nz) = (x as i64 + dx, top + dy, z as i64 + dz);
                    if nx < 0 || ny < 0 || nz < 0 {
                        continue;
                    }
                    let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
                    if !grid.dims().contains(nx, ny, nz) {
                        continue;
                    }
                    let current = grid.get(nx, ny, nz);
                    if current.is_air() || current.is_water() {
                        grid.set(nx, ny, nz, Block::LEAVES);
                    }
                }
            }
        }
    }

    fn chunk_seed(&self, coord: ChunkCoord) -> WorldSeed {
        let packed = (u64::from(coord.x as u32) << 32) | u64::from(coord.z as u32);
        self.seed.derive(Self::TREE_PURPOSE).derive(packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TerrainGenerator {
        TerrainGenerator::new(ChunkDims::new(16, 32, 16), TerrainConfig::default())
    }

    #[test]
    fn test_levels_scale_with_height() {
        let gen = generator();
        assert_eq!(gen.sea_level(), 9);
        assert_eq!(gen.max_terrain_height(), 19);
    }

    #[test]
    fn test_chunk_generation_determinism() {
        let gen1 = generator();
        let gen2 = generator();

        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 7), ChunkCoord::new(40, -12)] {
            let a = gen1.generate(coord);
            let b = gen2.generate(coord);
            assert_eq!(a, b, "Mismatch at chunk {coord:?}");
        }
    }

    #[test]
    fn test_final_height_in_range() {
        let gen = generator();
        for i in -200..200 {
            let sample = gen.column(i * 7, i * -3);
            assert!(sample.final_height < 32, "Height {} out of range", sample.final_height);
        }
    }

    #[test]
    fn test_trees_only_on_pure_vegetated_columns() {
        let config = TerrainConfig {
            seed: 21,
            tree_chance: 1.0,
            ..TerrainConfig::default()
        };
        let gen = TerrainGenerator::new(ChunkDims::new(16, 32, 16), config);
        let dims = gen.dims();
        let sea_level = gen.sea_level();

        for cx in -3..3 {
            for cz in -3..3 {
                let coord = ChunkCoord::new(cx, cz);
                let grid = gen.generate(coord);
                for z in 0..dims.size_z {
                    for x in 0..dims.size_x {
                        let sample = gen.column(coord.world_x(dims) + x as i32, coord.world_z(dims) + z as i32);
                        let h = sample.final_height;
                        if h + 1 >= dims.size_y {
                            continue;
                        }
                        let above = grid.get(x, h + 1, z);
                        if sample.biome.has_trees() && h >= sea_level {
                            assert_eq!(above, Block::TRUNK, "Missing tree at {coord:?} ({x}, {z})");
                        } else {
                            assert_ne!(
                                above,
                                Block::TRUNK,
                                "Tree on {:?} column (blended: {}) at {coord:?} ({x}, {z})",
                                sample.biome.dominant,
                                sample.biome.blended
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_tree_canopy_only_replaces_air_and_water() {
        let dims = ChunkDims::new(9, 16, 9);
        let mut grid = VoxelGrid::new(dims);
        grid.set(4, 9, 4, Block::ROCK);
        grid.set(5, 9, 4, Block::WATER);

        TerrainGenerator::place_tree(&mut grid, 4, 2, 4, 5);

        for y in 2..7 {
            assert_eq!(grid.get(4, y, 4), Block::TRUNK, "Trunk missing at y={y}");
        }
        assert_eq!(grid.get(4, 7, 4), Block::LEAVES);
        assert_eq!(grid.get(4, 9, 4), Block::ROCK, "Canopy must not overwrite solids");
        assert_eq!(grid.get(5, 9, 4), Block::LEAVES, "Canopy replaces water");
        // Corner of the cube is outside the sphere
        assert!(grid.get(1, 4, 1).is_air());
    }

    #[test]
    fn test_tree_clipped_at_chunk_top() {
        let dims = ChunkDims::new(4, 6, 4);
        let mut grid = VoxelGrid::new(dims);

        TerrainGenerator::place_tree(&mut grid, 0, 3, 0, 6);

        assert_eq!(grid.get(0, 5, 0), Block::TRUNK);
        assert_eq!(grid.dims(), dims);
    }
}
