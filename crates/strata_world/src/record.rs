//! Per-chunk registry record: voxels plus derived mesh bookkeeping.

use std::sync::Arc;

use strata_meshing::ChunkMesh;
use strata_procedural::{ChunkCoord, VoxelGrid};

/// A resident chunk.
///
/// Voxels and mesh are `Arc`-shared so snapshots can leave the registry
/// lock without copying. Edits go through `Arc::make_mut`.
#[derive(Clone, Debug)]
pub(crate) struct ChunkRecord {
    pub(crate) voxels: Arc<VoxelGrid>,
    pub(crate) mesh: Arc<ChunkMesh>,
    /// No render resource yet; one must be created.
    pub(crate) needs_create: bool,
    /// Render resource exists but the mesh changed.
    pub(crate) needs_update: bool,
    /// A non-empty mesh has been committed at least once.
    has_mesh: bool,
    /// Ticket of the last committed mesh; older tickets are discarded.
    mesh_ticket: u64,
    /// Number of committed meshes.
    pub(crate) revision: u64,
    /// Identifies this residency of the coordinate; a chunk removed and
    /// generated again gets a new epoch.
    pub(crate) epoch: u64,
}

impl ChunkRecord {
    pub(crate) fn new(voxels: Arc<VoxelGrid>, epoch: u64) -> Self {
        Self {
            voxels,
            mesh: Arc::new(ChunkMesh::default()),
            needs_create: false,
            needs_update: false,
            has_mesh: false,
            mesh_ticket: 0,
            revision: 0,
            epoch,
        }
    }

    /// Stores a freshly built mesh and raises the matching dirty flag.
    ///
    /// Returns false if a mesh from a later snapshot was already committed.
    pub(crate) fn commit_mesh(&mut self, ticket: u64, mesh: ChunkMesh) -> bool {
        if ticket <= self.mesh_ticket {
            return false;
        }
        self.mesh_ticket = ticket;

        if self.has_mesh {
            self.needs_update = true;
        } else if !mesh.is_empty() {
            self.has_mesh = true;
            self.needs_create = true;
        }
        self.mesh = Arc::new(mesh);
        self.revision += 1;
        true
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.needs_create || self.needs_update
    }
}

/// Read-only view of a resident chunk, handed to closures.
#[derive(Clone, Copy, Debug)]
pub struct ChunkView<'a> {
    /// Chunk coordinate.
    pub coord: ChunkCoord,
    /// Voxel data.
    pub voxels: &'a VoxelGrid,
    /// Current mesh.
    pub mesh: &'a ChunkMesh,
    /// The render collaborator must allocate a resource.
    pub needs_create: bool,
    /// The render collaborator must refresh its resource.
    pub needs_update: bool,
    /// Number of committed meshes.
    pub revision: u64,
}

impl ChunkView<'_> {
    /// Number of indices to draw.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.mesh.index_count()
    }

    pub(crate) fn of<'a>(coord: ChunkCoord, record: &'a ChunkRecord) -> ChunkView<'a> {
        ChunkView {
            coord,
            voxels: &record.voxels,
            mesh: &record.mesh,
            needs_create: record.needs_create,
            needs_update: record.needs_update,
            revision: record.revision,
        }
    }
}

/// Mesh pending upload, cloned out of the registry for the render thread.
#[derive(Clone, Debug)]
pub struct DirtyChunk {
    /// Chunk coordinate.
    pub coord: ChunkCoord,
    /// Mesh to upload.
    pub mesh: Arc<ChunkMesh>,
    /// First upload for this chunk.
    pub needs_create: bool,
    /// Refresh of an earlier upload.
    pub needs_update: bool,
    /// Revision to acknowledge once uploaded.
    pub revision: u64,
    /// Residency the mesh belongs to.
    pub epoch: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_meshing::{ChunkMesher, Neighbors};
    use strata_procedural::{Block, ChunkDims};

    fn solid_mesh() -> ChunkMesh {
        let mut grid = VoxelGrid::new(ChunkDims::new(2, 2, 2));
        grid.set(0, 1, 0, Block::ROCK);
        ChunkMesher::default().build(&grid, &Neighbors::default())
    }

    fn record() -> ChunkRecord {
        ChunkRecord::new(Arc::new(VoxelGrid::new(ChunkDims::new(2, 2, 2))), 1)
    }

    #[test]
    fn test_first_non_empty_mesh_needs_create() {
        let mut r = record();
        assert!(r.commit_mesh(1, solid_mesh()));
        assert!(r.needs_create);
        assert!(!r.needs_update);
        assert_eq!(r.revision, 1);
    }

    #[test]
    fn test_empty_first_mesh_sets_no_flag() {
        let mut r = record();
        assert!(r.commit_mesh(1, ChunkMesh::default()));
        assert!(!r.is_dirty());

        assert!(r.commit_mesh(2, solid_mesh()));
        assert!(r.needs_create);
    }

    #[test]
    fn test_later_meshes_need_update() {
        let mut r = record();
        r.commit_mesh(1, solid_mesh());
        r.needs_create = false;

        r.commit_mesh(2, ChunkMesh::default());
        assert!(r.needs_update);
        assert!(!r.needs_create);
    }

    #[test]
    fn test_stale_ticket_discarded() {
        let mut r = record();
        assert!(r.commit_mesh(5, solid_mesh()));
        assert!(!r.commit_mesh(3, ChunkMesh::default()));
        assert!(!r.mesh.is_empty());
        assert_eq!(r.revision, 1);
    }
}
