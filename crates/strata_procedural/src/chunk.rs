//! # Chunk Data Model
//!
//! World data is organized into fixed-size columns of voxels ("chunks"):
//! - Only chunks near the observer are resident
//! - Each chunk is generated, meshed and discarded independently
//!
//! ## Layout
//!
//! A chunk is `size_x × size_y × size_z` blocks stored flat with
//! `idx = x + y*size_x + z*size_x*size_y` (x fastest-varying).
//! Chunks tile the XZ plane; the world has a single chunk layer in Y.

use serde::{Deserialize, Serialize};

/// A single voxel.
///
/// The id alone decides meshing: id 0 is air and never emits faces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Block {
    /// Block type ID (0 = air).
    pub id: u8,
    /// Linear RGB color baked into the mesh.
    pub color: [f32; 3],
}

impl Block {
    /// Air block (empty).
    pub const AIR: Self = Self::new(0, [0.0, 0.0, 0.0]);
    /// Deep rock below the soil layer.
    pub const ROCK: Self = Self::new(3, [0.5, 0.5, 0.5]);
    /// Tree trunk.
    pub const TRUNK: Self = Self::new(5, [0.5, 0.3, 0.1]);
    /// Tree canopy.
    pub const LEAVES: Self = Self::new(6, [0.0, 0.8, 0.0]);
    /// Water filling empty space up to sea level.
    pub const WATER: Self = Self::new(7, [0.0, 0.0, 1.0]);

    /// Creates a block.
    #[inline]
    #[must_use]
    pub const fn new(id: u8, color: [f32; 3]) -> Self {
        Self { id, color }
    }

    /// Returns true if this is an air block.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.id == 0
    }

    /// Returns true if this is a water block.
    #[inline]
    #[must_use]
    pub const fn is_water(self) -> bool {
        self.id == Self::WATER.id
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::AIR
    }
}

/// Per-chunk dimensions, shared by every chunk of a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkDims {
    /// Width in blocks.
    pub size_x: usize,
    /// Height in blocks.
    pub size_y: usize,
    /// Depth in blocks.
    pub size_z: usize,
}

impl ChunkDims {
    /// Creates chunk dimensions.
    #[inline]
    #[must_use]
    pub const fn new(size_x: usize, size_y: usize, size_z: usize) -> Self {
        Self { size_x, size_y, size_z }
    }

    /// Total voxels per chunk.
    #[inline]
    #[must_use]
    pub const fn volume(self) -> usize {
        self.size_x * self.size_y * self.size_z
    }

    /// Flat index of a local position. Caller guarantees bounds.
    #[inline]
    #[must_use]
    pub const fn index(self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.size_x + z * self.size_x * self.size_y
    }

    /// Returns true if the local position lies inside a chunk.
    #[inline]
    #[must_use]
    pub const fn contains(self, x: usize, y: usize, z: usize) -> bool {
        x < self.size_x && y < self.size_y && z < self.size_z
    }

    /// Resolves a world block position to its chunk and local offset.
    ///
    /// Uses floor division, so `x = -1` lands in chunk `-1` at local
    /// `size_x - 1`. Returns `None` when `y` is outside `[0, size_y)`.
    #[must_use]
    pub fn locate(self, x: i32, y: i32, z: i32) -> Option<(ChunkCoord, LocalPos)> {
        if y < 0 || y as usize >= self.size_y {
            return None;
        }
        let sx = self.size_x as i32;
        let sz = self.size_z as i32;
        let coord = ChunkCoord::new(x.div_euclid(sx), z.div_euclid(sz));
        let local = LocalPos {
            x: x.rem_euclid(sx) as usize,
            y: y as usize,
            z: z.rem_euclid(sz) as usize,
        };
        Some((coord, local))
    }
}

impl Default for ChunkDims {
    fn default() -> Self {
        Self::new(16, 32, 16)
    }
}

/// A position inside one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalPos {
    /// Local X in `[0, size_x)`.
    pub x: usize,
    /// Y in `[0, size_y)`.
    pub y: usize,
    /// Local Z in `[0, size_z)`.
    pub z: usize,
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a continuous world position (e.g. the observer).
    #[must_use]
    pub fn from_world_pos(world_x: f64, world_z: f64, dims: ChunkDims) -> Self {
        Self {
            x: (world_x / dims.size_x as f64).floor() as i32,
            z: (world_z / dims.size_z as f64).floor() as i32,
        }
    }

    /// Returns the world X coordinate of the chunk's origin (corner).
    #[inline]
    #[must_use]
    pub const fn world_x(self, dims: ChunkDims) -> i32 {
        self.x * dims.size_x as i32
    }

    /// Returns the world Z coordinate of the chunk's origin.
    #[inline]
    #[must_use]
    pub const fn world_z(self, dims: ChunkDims) -> i32 {
        self.z * dims.size_z as i32
    }

    /// Returns the coordinate shifted by `(dx, dz)` chunks.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// The four axis-aligned neighbors.
    #[must_use]
    pub const fn neighbors(self) -> [(Side, Self); 4] {
        [
            (Side::Left, self.offset(-1, 0)),
            (Side::Right, self.offset(1, 0)),
            (Side::Back, self.offset(0, -1)),
            (Side::Front, self.offset(0, 1)),
        ]
    }

    /// Chebyshev distance in chunks.
    #[inline]
    #[must_use]
    pub const fn chebyshev(self, other: Self) -> i32 {
        let dx = (self.x - other.x).abs();
        let dz = (self.z - other.z).abs();
        if dx > dz { dx } else { dz }
    }

    /// World-space bounding box of the chunk, for frustum culling.
    #[must_use]
    pub fn bounds(self, dims: ChunkDims) -> Aabb {
        let min_x = self.world_x(dims) as f32;
        let min_z = self.world_z(dims) as f32;
        Aabb {
            min: [min_x, 0.0, min_z],
            max: [
                min_x + dims.size_x as f32,
                dims.size_y as f32,
                min_z + dims.size_z as f32,
            ],
        }
    }
}

/// Horizontal neighbor direction of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// -X
    Left,
    /// +X
    Right,
    /// -Z
    Back,
    /// +Z
    Front,
}

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl Aabb {
    /// Returns true if the point lies inside (min inclusive, max exclusive).
    #[must_use]
    pub fn contains_point(&self, p: [f32; 3]) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] < self.max[i])
    }
}

/// Voxel storage of one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    dims: ChunkDims,
    blocks: Vec<Block>,
}

impl VoxelGrid {
    /// Creates an all-air grid.
    #[must_use]
    pub fn new(dims: ChunkDims) -> Self {
        Self {
            dims,
            blocks: vec![Block::AIR; dims.volume()],
        }
    }

    /// Dimensions of this grid.
    #[inline]
    #[must_use]
    pub const fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// Gets a block at local coordinates; air when out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Block {
        if self.dims.contains(x, y, z) {
            self.blocks[self.dims.index(x, y, z)]
        } else {
            Block::AIR
        }
    }

    /// Sets a block at local coordinates. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: Block) {
        if self.dims.contains(x, y, z) {
            let idx = self.dims.index(x, y, z);
            self.blocks[idx] = block;
        }
    }

    /// Returns true if the local position holds air.
    #[inline]
    #[must_use]
    pub fn is_air(&self, x: usize, y: usize, z: usize) -> bool {
        self.get(x, y, z).is_air()
    }

    /// Flat block storage in layout order.
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of non-air voxels.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_air()).count()
    }

    /// Highest non-air, non-water voxel in a column.
    #[must_use]
    pub fn surface_height(&self, x: usize, z: usize) -> Option<usize> {
        (0..self.dims.size_y)
            .rev()
            .find(|&y| {
                let block = self.get(x, y, z);
                !block.is_air() && !block.is_water()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_layout_is_x_fastest() {
        let dims = ChunkDims::new(4, 3, 2);
        assert_eq!(dims.index(1, 0, 0), 1);
        assert_eq!(dims.index(0, 1, 0), 4);
        assert_eq!(dims.index(0, 0, 1), 12);
        assert_eq!(dims.index(3, 2, 1), dims.volume() - 1);

        let mut grid = VoxelGrid::new(dims);
        grid.set(1, 1, 0, Block::ROCK);
        assert_eq!(grid.blocks().len(), dims.volume());
        assert_eq!(grid.blocks()[dims.index(1, 1, 0)], Block::ROCK);
        assert_eq!(grid.solid_count(), 1);
    }

    #[test]
    fn test_negative_coordinates_resolve_by_floor_division() {
        let dims = ChunkDims::new(16, 32, 16);

        let (coord, local) = dims.locate(-1, 5, 0).expect("y in range");
        assert_eq!(coord, ChunkCoord::new(-1, 0));
        assert_eq!(local, LocalPos { x: 15, y: 5, z: 0 });

        let (coord, local) = dims.locate(-17, 0, -16).expect("y in range");
        assert_eq!(coord, ChunkCoord::new(-2, -1));
        assert_eq!((local.x, local.z), (15, 0));
    }

    #[test]
    fn test_locate_rejects_out_of_range_y() {
        let dims = ChunkDims::new(16, 32, 16);
        assert!(dims.locate(0, -1, 0).is_none());
        assert!(dims.locate(0, 32, 0).is_none());
        assert!(dims.locate(0, 31, 0).is_some());
    }

    #[test]
    fn test_observer_chunk_uses_floor() {
        let dims = ChunkDims::new(16, 32, 16);
        assert_eq!(ChunkCoord::from_world_pos(15.9, 0.0, dims), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world_pos(-0.5, 16.0, dims), ChunkCoord::new(-1, 1));
    }

    #[test]
    fn test_bounds() {
        let dims = ChunkDims::new(16, 32, 16);
        let aabb = ChunkCoord::new(-1, 2).bounds(dims);
        assert_eq!(aabb.min, [-16.0, 0.0, 32.0]);
        assert_eq!(aabb.max, [0.0, 32.0, 48.0]);
        assert!(aabb.contains_point([-1.0, 10.0, 40.0]));
        assert!(!aabb.contains_point([0.0, 10.0, 40.0]));
    }

    #[test]
    fn test_grid_out_of_bounds_is_air() {
        let mut grid = VoxelGrid::new(ChunkDims::new(2, 2, 2));
        grid.set(5, 0, 0, Block::ROCK);
        assert_eq!(grid.solid_count(), 0);
        assert!(grid.is_air(0, 2, 0));

        grid.set(1, 1, 1, Block::ROCK);
        assert_eq!(grid.get(1, 1, 1), Block::ROCK);
        assert_eq!(grid.solid_count(), 1);
    }

    #[test]
    fn test_surface_height_skips_water() {
        let mut grid = VoxelGrid::new(ChunkDims::new(1, 8, 1));
        grid.set(0, 0, 0, Block::ROCK);
        grid.set(0, 1, 0, Block::ROCK);
        grid.set(0, 2, 0, Block::WATER);
        assert_eq!(grid.surface_height(0, 0), Some(1));
    }
}
