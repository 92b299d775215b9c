//! Chunk Mesher - face-culled quads, one per exposed voxel face
//!
//! A face is emitted when the voxel one step in the face direction is air.
//! Faces on the chunk border consult the neighbor snapshot at the mirrored
//! coordinate; what a *missing* neighbor means is decided by `BoundaryPolicy`.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use strata_procedural::VoxelGrid;

// =============================================================================
// VERTEX FORMAT - 9 floats: position, normal, color
// =============================================================================

/// Vertex for terrain meshes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in chunk-local space [x, y, z]
    pub position: [f32; 3],
    /// Face normal [nx, ny, nz]
    pub normal: [f32; 3],
    /// Voxel color [r, g, b]
    pub color: [f32; 3],
}

impl MeshVertex {
    /// Floats per vertex.
    pub const FLOATS: usize = 9;
}

// =============================================================================
// FACE TABLE
// =============================================================================

struct Face {
    offset: [i32; 3],
    corners: [[f32; 3]; 4],
}

const FACES: [Face; 6] = [
    Face {
        offset: [0, 0, 1],
        corners: [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    },
    Face {
        offset: [0, 0, -1],
        corners: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
    },
    Face {
        offset: [-1, 0, 0],
        corners: [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    },
    Face {
        offset: [1, 0, 0],
        corners: [[1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]],
    },
    Face {
        offset: [0, 1, 0],
        corners: [[0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    },
    Face {
        offset: [0, -1, 0],
        corners: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
    },
];

/// Two triangles per quad, relative to the quad's first vertex.
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

// =============================================================================
// NEIGHBORS
// =============================================================================

/// Point-in-time voxels of the four horizontal neighbors.
#[derive(Clone, Copy, Debug, Default)]
pub struct Neighbors<'a> {
    /// Chunk at `x - 1`.
    pub left: Option<&'a VoxelGrid>,
    /// Chunk at `x + 1`.
    pub right: Option<&'a VoxelGrid>,
    /// Chunk at `z - 1`.
    pub back: Option<&'a VoxelGrid>,
    /// Chunk at `z + 1`.
    pub front: Option<&'a VoxelGrid>,
}

impl Neighbors<'_> {
    /// Number of neighbors present.
    #[must_use]
    pub fn count(&self) -> usize {
        [self.left, self.right, self.back, self.front]
            .iter()
            .filter(|n| n.is_some())
            .count()
    }
}

/// How a face on the chunk border is treated when the neighbor is absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Missing neighbor is air: border faces are drawn.
    #[default]
    Open,
    /// Missing neighbor is solid: border faces are culled until it loads.
    Sealed,
}

// =============================================================================
// MESH OUTPUT
// =============================================================================

/// Complete mesh data for a chunk (vertices + indices).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    /// Vertex buffer data
    pub vertices: Vec<MeshVertex>,
    /// Index buffer data
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    /// Check if mesh is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of quads.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of indices (what the draw call consumes).
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Vertices as a flat float stream, 9 per vertex.
    #[must_use]
    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Vertex buffer bytes for upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer bytes for upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    fn push_quad(&mut self, x: usize, y: usize, z: usize, face: &Face, color: [f32; 3]) {
        let start = self.vertices.len() as u32;
        let normal = face.offset.map(|o| o as f32);
        for corner in &face.corners {
            self.vertices.push(MeshVertex {
                position: [x as f32 + corner[0], y as f32 + corner[1], z as f32 + corner[2]],
                normal,
                color,
            });
        }
        self.indices.extend(QUAD_INDICES.iter().map(|i| start + i));
    }
}

// =============================================================================
// MESHER
// =============================================================================

/// Face-culling mesher.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkMesher {
    policy: BoundaryPolicy,
}

impl ChunkMesher {
    /// Creates a mesher with the given boundary policy.
    #[must_use]
    pub const fn new(policy: BoundaryPolicy) -> Self {
        Self { policy }
    }

    /// Boundary policy in use.
    #[must_use]
    pub const fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    /// Builds the mesh of `grid` against a neighbor snapshot.
    #[must_use]
    pub fn build(&self, grid: &VoxelGrid, neighbors: &Neighbors<'_>) -> ChunkMesh {
        let dims = grid.dims();
        let mut mesh = ChunkMesh::default();

        for z in 0..dims.size_z {
            for y in 0..dims.size_y {
                for x in 0..dims.size_x {
                    let block = grid.get(x, y, z);
                    if block.is_air() {
                        continue;
                    }
                    for face in &FACES {
                        // The world floor is never drawn
                        if y == 0 && face.offset[1] == -1 {
                            continue;
                        }
                        let nx = x as i64 + i64::from(face.offset[0]);
                        let ny = y as i64 + i64::from(face.offset[1]);
                        let nz = z as i64 + i64::from(face.offset[2]);
                        if self.is_air(grid, neighbors, nx, ny, nz) {
                            mesh.push_quad(x, y, z, face, block.color);
                        }
                    }
                }
            }
        }

        mesh
    }

    /// Air test for a position that may lie one step outside the chunk.
    #[must_use]
    pub fn is_air(&self, grid: &VoxelGrid, neighbors: &Neighbors<'_>, x: i64, y: i64, z: i64) -> bool {
        let dims = grid.dims();
        let (sx, sy, sz) = (dims.size_x as i64, dims.size_y as i64, dims.size_z as i64);

        if y < 0 || y >= sy {
            return true;
        }
        if (0..sx).contains(&x) && (0..sz).contains(&z) {
            return grid.is_air(x as usize, y as usize, z as usize);
        }

        let y = y as usize;
        let lookup = |neighbor: Option<&VoxelGrid>, nx: usize, nz: usize| match neighbor {
            Some(n) if n.dims() == dims => n.is_air(nx, y, nz),
            // Mismatched dimensions never line up
            Some(_) => true,
            None => self.policy == BoundaryPolicy::Open,
        };

        if x < 0 {
            lookup(neighbors.left, dims.size_x - 1, z as usize)
        } else if x >= sx {
            lookup(neighbors.right, 0, z as usize)
        } else if z < 0 {
            lookup(neighbors.back, x as usize, dims.size_z - 1)
        } else {
            lookup(neighbors.front, x as usize, 0)
        }
    }
}
