//! Render Side-Table - GPU handles live with the renderer, keyed by chunk
//!
//! The registry never stores rendering-API objects. It exposes dirty flags
//! and a revision per chunk, and posts a `ChunkRelease` when a chunk leaves.
//! The render thread owns a `ResourceTable` and calls `sync` once per frame:
//!
//! 1. destroy resources of released chunks
//! 2. create resources for chunks flagged `needs_create`
//! 3. refresh resources for chunks flagged `needs_update`
//! 4. acknowledge the uploaded revision so the flags clear
//!
//! Handles are tagged with the residency epoch they were built for. A
//! release only frees a handle of its own epoch or older, so a release
//! drained after the coordinate was generated again cannot free the new
//! chunk's resources.

use std::collections::HashMap;

use strata_meshing::ChunkMesh;
use strata_procedural::ChunkCoord;

use crate::queue::ReleaseQueue;
use crate::world::World;

/// GPU-facing operations the table drives.
///
/// Implemented by the renderer; a handle typically bundles the vertex
/// array, vertex buffer and index buffer of one chunk.
pub trait RenderBackend {
    /// Per-chunk resource bundle.
    type Handle;

    /// Allocates resources and uploads `mesh`.
    fn create(&mut self, coord: ChunkCoord, mesh: &ChunkMesh) -> Self::Handle;

    /// Re-uploads `mesh` into existing resources.
    fn update(&mut self, handle: &mut Self::Handle, mesh: &ChunkMesh);

    /// Frees resources.
    fn destroy(&mut self, handle: Self::Handle);
}

/// Work done by one `sync` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Resources allocated.
    pub created: usize,
    /// Resources refreshed.
    pub updated: usize,
    /// Resources freed.
    pub destroyed: usize,
}

/// Coordinate-keyed table of render resources.
pub struct ResourceTable<B: RenderBackend> {
    backend: B,
    handles: HashMap<ChunkCoord, (u64, B::Handle)>,
}

impl<B: RenderBackend> ResourceTable<B> {
    /// Creates an empty table around a backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            handles: HashMap::new(),
        }
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Handle of a chunk, if allocated.
    pub fn handle(&self, coord: ChunkCoord) -> Option<&B::Handle> {
        self.handles.get(&coord).map(|(_, handle)| handle)
    }

    /// Number of allocated resource bundles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if nothing is allocated.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Applies pending releases and uploads, then clears the dirty flags.
    pub fn sync(&mut self, world: &World, releases: &ReleaseQueue) -> SyncReport {
        let mut report = SyncReport::default();

        for release in releases.drain() {
            let stale = self
                .handles
                .get(&release.coord)
                .is_some_and(|(epoch, _)| *epoch <= release.epoch);
            if stale {
                if let Some((_, handle)) = self.handles.remove(&release.coord) {
                    self.backend.destroy(handle);
                    report.destroyed += 1;
                }
            }
        }

        for dirty in world.dirty_chunks() {
            // Resources of an earlier residency whose release is still queued
            let outdated = self
                .handles
                .get(&dirty.coord)
                .is_some_and(|(epoch, _)| *epoch != dirty.epoch);
            if outdated {
                if let Some((_, handle)) = self.handles.remove(&dirty.coord) {
                    self.backend.destroy(handle);
                    report.destroyed += 1;
                }
            }

            if let Some((_, handle)) = self.handles.get_mut(&dirty.coord) {
                self.backend.update(handle, &dirty.mesh);
                report.updated += 1;
            } else if !dirty.mesh.is_empty() {
                let handle = self.backend.create(dirty.coord, &dirty.mesh);
                self.handles.insert(dirty.coord, (dirty.epoch, handle));
                report.created += 1;
            }
            world.acknowledge_upload(dirty.coord, dirty.revision);
        }

        report
    }

    /// Frees every resource, e.g. on renderer shutdown.
    pub fn clear(&mut self) {
        for (_, (_, handle)) in self.handles.drain() {
            self.backend.destroy(handle);
        }
    }
}
