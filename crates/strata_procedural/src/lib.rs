//! # STRATA Procedural Generation
//!
//! Deterministic terrain for an effectively infinite voxel world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and coordinate always produce the same voxels
//! 2. **Chunked**: The world is generated in fixed-size columns
//! 3. **Injected state**: Noise fields are owned by the generator, never global
//!
//! ## Core Components
//!
//! - `SimplexNoise` / `NoiseSources`: 2D noise fields
//! - `pick_biome`: biome bands with smoothstep blending
//! - `TerrainGenerator`: produces a `VoxelGrid` per `ChunkCoord`
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_procedural::{ChunkCoord, ChunkDims, TerrainConfig, TerrainGenerator};
//!
//! let gen = TerrainGenerator::new(ChunkDims::new(16, 32, 16), TerrainConfig::default());
//! let grid = gen.generate(ChunkCoord::new(0, 0));
//! assert!(grid.solid_count() > 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod biome;
pub mod chunk;
pub mod noise;
pub mod terrain;

pub use biome::{pick_biome, Biome, BiomeParams, ColumnBiome};
pub use chunk::{Aabb, Block, ChunkCoord, ChunkDims, LocalPos, Side, VoxelGrid};
pub use noise::{NoiseSources, SimplexNoise, WorldSeed};
pub use terrain::{ColumnSample, TerrainConfig, TerrainGenerator};
