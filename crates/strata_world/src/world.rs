//! # Chunk Registry
//!
//! Coordinate-keyed store of resident chunks, shared by the scheduler,
//! the worker pool, the player and the render thread.
//!
//! ## Locking
//!
//! Chunks are spread over `SHARD_COUNT` shards, each behind its own
//! `parking_lot::RwLock`, picked by coordinate hash. No lock is ever held
//! while synthesizing terrain or building a mesh: the work runs on `Arc`
//! snapshots and the shard lock is re-taken only to commit the result.
//! At most one shard lock is held at a time.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use strata_meshing::{ChunkMesher, Neighbors};
use strata_procedural::{Block, ChunkCoord, ChunkDims, Side, TerrainGenerator, VoxelGrid};

use crate::config::WorldConfig;
use crate::queue::{ChunkRelease, Offer, ReleaseQueue, RequestQueue};
use crate::record::{ChunkRecord, ChunkView, DirtyChunk};
use crate::streaming::desired_region;

/// Number of registry shards.
pub const SHARD_COUNT: usize = 16;

#[derive(Default)]
struct Shard {
    chunks: HashMap<ChunkCoord, ChunkRecord>,
    /// Coordinates claimed by a generation worker but not yet inserted.
    pending: HashSet<ChunkCoord>,
}

/// Snapshot of the four horizontal neighbors of a chunk.
#[derive(Clone, Debug, Default)]
pub struct NeighborSet {
    /// Chunk at `x - 1`.
    pub left: Option<Arc<VoxelGrid>>,
    /// Chunk at `x + 1`.
    pub right: Option<Arc<VoxelGrid>>,
    /// Chunk at `z - 1`.
    pub back: Option<Arc<VoxelGrid>>,
    /// Chunk at `z + 1`.
    pub front: Option<Arc<VoxelGrid>>,
}

impl NeighborSet {
    /// Borrowed form consumed by the mesher.
    #[must_use]
    pub fn as_neighbors(&self) -> Neighbors<'_> {
        Neighbors {
            left: self.left.as_deref(),
            right: self.right.as_deref(),
            back: self.back.as_deref(),
            front: self.front.as_deref(),
        }
    }
}

/// Lifetime counters of a world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Chunks currently resident.
    pub resident: usize,
    /// Chunks claimed and being synthesized.
    pub pending: usize,
    /// Chunks synthesized and inserted.
    pub generated: u64,
    /// Chunks removed.
    pub removed: u64,
    /// Generation requests skipped because the chunk was resident or claimed.
    pub redundant_skipped: u64,
    /// Meshes committed.
    pub remeshes: u64,
    /// Voxel edits applied.
    pub edits: u64,
}

/// Result of one `update_chunks` pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Observer's chunk.
    pub center: ChunkCoord,
    /// Admission requests queued.
    pub admitted: usize,
    /// Admission requests refused or already waiting.
    pub deferred: usize,
    /// Eviction requests queued or already waiting.
    pub evicted: usize,
}

#[derive(Default)]
struct Counters {
    generated: AtomicU64,
    removed: AtomicU64,
    redundant_skipped: AtomicU64,
    remeshes: AtomicU64,
    edits: AtomicU64,
}

/// Voxel world containing resident chunks.
///
/// Thread-safe: every method takes `&self`.
pub struct World {
    dims: ChunkDims,
    generator: TerrainGenerator,
    mesher: ChunkMesher,
    shards: Box<[RwLock<Shard>]>,
    /// Orders mesh commits; a mesh built later always wins.
    mesh_tickets: AtomicU64,
    /// Source of residency epochs.
    epochs: AtomicU64,
    counters: Counters,
}

impl World {
    /// Creates an empty world around a terrain generator.
    #[must_use]
    pub fn new(generator: TerrainGenerator, mesher: ChunkMesher) -> Self {
        Self {
            dims: generator.dims(),
            generator,
            mesher,
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(Shard::default())).collect(),
            mesh_tickets: AtomicU64::new(0),
            epochs: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    /// Creates an empty world from a validated config.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(
            TerrainGenerator::new(config.chunk, config.terrain),
            ChunkMesher::new(config.streaming.boundary),
        )
    }

    /// Per-chunk dimensions.
    #[inline]
    #[must_use]
    pub const fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// The terrain generator.
    #[must_use]
    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    #[inline]
    fn shard(&self, coord: ChunkCoord) -> &RwLock<Shard> {
        let h = (coord.x as u32).wrapping_mul(0x9E37_79B1) ^ (coord.z as u32).wrapping_mul(0x85EB_CA77);
        &self.shards[(h >> 16) as usize % SHARD_COUNT]
    }

    // =========================================================================
    // BLOCK ACCESS
    // =========================================================================

    /// Gets the block at world coordinates.
    ///
    /// Air if `y` is out of range or the owning chunk is not resident.
    #[must_use]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Block {
        let Some((coord, local)) = self.dims.locate(x, y, z) else {
            return Block::AIR;
        };
        self.shard(coord)
            .read()
            .chunks
            .get(&coord)
            .map_or(Block::AIR, |record| record.voxels.get(local.x, local.y, local.z))
    }

    /// Sets the block at world coordinates and remeshes the affected chunks.
    ///
    /// No-op if `y` is out of range or the owning chunk is not resident.
    /// The edited chunk and every resident neighbor are remeshed, since a
    /// voxel on a border changes face visibility on both sides.
    pub fn set_block(&self, x: i32, y: i32, z: i32, block: Block) {
        let Some((coord, local)) = self.dims.locate(x, y, z) else {
            return;
        };
        {
            let mut shard = self.shard(coord).write();
            let Some(record) = shard.chunks.get_mut(&coord) else {
                return;
            };
            Arc::make_mut(&mut record.voxels).set(local.x, local.y, local.z, block);
        }
        self.counters.edits.fetch_add(1, Ordering::Relaxed);

        self.remesh(coord);
        for (_, neighbor) in coord.neighbors() {
            self.remesh(neighbor);
        }
    }

    /// Replaces the block at world coordinates with air.
    pub fn remove_block(&self, x: i32, y: i32, z: i32) {
        self.set_block(x, y, z, Block::AIR);
    }

    /// Y of the highest non-air, non-water block in a resident column.
    #[must_use]
    pub fn surface_height(&self, x: i32, z: i32) -> Option<i32> {
        let (coord, local) = self.dims.locate(x, 0, z)?;
        self.shard(coord)
            .read()
            .chunks
            .get(&coord)
            .and_then(|record| record.voxels.surface_height(local.x, local.z))
            .map(|y| y as i32)
    }

    // =========================================================================
    // CHUNK LIFECYCLE
    // =========================================================================

    /// Voxel snapshot of a resident chunk.
    #[must_use]
    pub fn voxels(&self, coord: ChunkCoord) -> Option<Arc<VoxelGrid>> {
        self.shard(coord)
            .read()
            .chunks
            .get(&coord)
            .map(|record| Arc::clone(&record.voxels))
    }

    /// Snapshots the four horizontal neighbors. Absent ones are `None`.
    #[must_use]
    pub fn collect_neighbors(&self, coord: ChunkCoord) -> NeighborSet {
        let mut set = NeighborSet::default();
        for (side, neighbor) in coord.neighbors() {
            let voxels = self.voxels(neighbor);
            match side {
                Side::Left => set.left = voxels,
                Side::Right => set.right = voxels,
                Side::Back => set.back = voxels,
                Side::Front => set.front = voxels,
            }
        }
        set
    }

    /// Synthesizes, inserts and meshes the chunk at `coord`.
    ///
    /// Idempotent: returns false without touching anything if the chunk is
    /// resident or another worker has already claimed it. After insertion
    /// every resident neighbor is remeshed against its own fresh snapshot.
    pub fn generate_chunk(&self, coord: ChunkCoord) -> bool {
        {
            let mut shard = self.shard(coord).write();
            if shard.chunks.contains_key(&coord) || !shard.pending.insert(coord) {
                self.counters.redundant_skipped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }

        let voxels = Arc::new(self.generator.generate(coord));
        let epoch = self.epochs.fetch_add(1, Ordering::Relaxed) + 1;

        {
            let mut shard = self.shard(coord).write();
            shard.pending.remove(&coord);
            shard.chunks.insert(coord, ChunkRecord::new(voxels, epoch));
        }
        self.counters.generated.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(x = coord.x, z = coord.z, "chunk generated");

        self.remesh(coord);
        for (_, neighbor) in coord.neighbors() {
            self.remesh(neighbor);
        }
        true
    }

    /// Removes the chunk at `coord` and posts a release for its resources.
    ///
    /// The release is queued before the shard lock is dropped, so it always
    /// precedes anything a later generation of the same coordinate commits.
    /// Returns false if it was not resident.
    pub fn remove_chunk(&self, coord: ChunkCoord, releases: &ReleaseQueue) -> bool {
        {
            let mut shard = self.shard(coord).write();
            let Some(record) = shard.chunks.remove(&coord) else {
                return false;
            };
            releases.push(ChunkRelease {
                coord,
                revision: record.revision,
                epoch: record.epoch,
            });
        }
        self.counters.removed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(x = coord.x, z = coord.z, "chunk removed");
        true
    }

    /// Rebuilds the mesh of a resident chunk. Returns false if absent or
    /// superseded by a newer mesh.
    pub fn remesh(&self, coord: ChunkCoord) -> bool {
        // Ticket first: any edit that finished before this point is in the snapshot
        let ticket = self.mesh_tickets.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(voxels) = self.voxels(coord) else {
            return false;
        };
        let neighbors = self.collect_neighbors(coord);
        let mesh = self.mesher.build(&voxels, &neighbors.as_neighbors());

        let committed = self
            .shard(coord)
            .write()
            .chunks
            .get_mut(&coord)
            .is_some_and(|record| record.commit_mesh(ticket, mesh));
        if committed {
            self.counters.remeshes.fetch_add(1, Ordering::Relaxed);
        }
        committed
    }

    // =========================================================================
    // STREAMING
    // =========================================================================

    /// Requests admission of missing chunks around the observer and
    /// eviction of resident chunks outside the square of `radius`.
    ///
    /// Admission never blocks: a full queue defers the request to a later
    /// tick. Eviction is sent for every out-of-range resident chunk.
    pub fn update_chunks(
        &self,
        observer_x: f64,
        observer_z: f64,
        radius: u32,
        admit: &RequestQueue,
        evict: &RequestQueue,
    ) -> UpdateReport {
        let center = ChunkCoord::from_world_pos(observer_x, observer_z, self.dims);
        let mut report = UpdateReport {
            center,
            ..UpdateReport::default()
        };

        for coord in desired_region(center, radius) {
            if self.contains_or_pending(coord) {
                continue;
            }
            match admit.offer(coord) {
                Offer::Accepted => report.admitted += 1,
                Offer::Coalesced | Offer::Dropped => report.deferred += 1,
                Offer::Closed => {
                    tracing::warn!(queue = admit.name(), "admission queue closed");
                    break;
                }
            }
        }

        let reach = i32::try_from(radius).unwrap_or(i32::MAX);
        for coord in self.resident_coords() {
            if coord.chebyshev(center) > reach {
                match evict.offer(coord) {
                    Offer::Accepted | Offer::Coalesced => report.evicted += 1,
                    Offer::Dropped | Offer::Closed => {
                        tracing::warn!(queue = evict.name(), x = coord.x, z = coord.z, "eviction refused");
                    }
                }
            }
        }

        report
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Returns true if the chunk is resident.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.shard(coord).read().chunks.contains_key(&coord)
    }

    /// Returns true if a worker has claimed the chunk but not inserted it yet.
    #[must_use]
    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.shard(coord).read().pending.contains(&coord)
    }

    fn contains_or_pending(&self, coord: ChunkCoord) -> bool {
        let shard = self.shard(coord).read();
        shard.chunks.contains_key(&coord) || shard.pending.contains(&coord)
    }

    /// Number of resident chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.shards.iter().map(|s| s.read().chunks.len()).sum()
    }

    /// Coordinates of all resident chunks, sorted.
    #[must_use]
    pub fn resident_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self
            .shards
            .iter()
            .flat_map(|s| s.read().chunks.keys().copied().collect::<Vec<_>>())
            .collect();
        coords.sort_unstable();
        coords
    }

    /// Executes a closure with read access to a chunk.
    pub fn with_chunk<F, R>(&self, coord: ChunkCoord, f: F) -> Option<R>
    where
        F: FnOnce(ChunkView<'_>) -> R,
    {
        self.shard(coord)
            .read()
            .chunks
            .get(&coord)
            .map(|record| f(ChunkView::of(coord, record)))
    }

    /// Visits every resident chunk, one shard read lock at a time.
    pub fn for_each_chunk<F>(&self, mut f: F)
    where
        F: FnMut(ChunkView<'_>),
    {
        for shard in self.shards.iter() {
            let shard = shard.read();
            for (&coord, record) in &shard.chunks {
                f(ChunkView::of(coord, record));
            }
        }
    }

    /// Chunks whose mesh has not been uploaded yet.
    #[must_use]
    pub fn dirty_chunks(&self) -> Vec<DirtyChunk> {
        let mut dirty = Vec::new();
        for shard in self.shards.iter() {
            let shard = shard.read();
            dirty.extend(shard.chunks.iter().filter(|(_, r)| r.is_dirty()).map(|(&coord, r)| DirtyChunk {
                coord,
                mesh: Arc::clone(&r.mesh),
                needs_create: r.needs_create,
                needs_update: r.needs_update,
                revision: r.revision,
                epoch: r.epoch,
            }));
        }
        dirty
    }

    /// Clears the dirty flags once the render collaborator has uploaded
    /// `revision`. A newer mesh committed meanwhile stays dirty.
    pub fn acknowledge_upload(&self, coord: ChunkCoord, revision: u64) -> bool {
        let mut shard = self.shard(coord).write();
        match shard.chunks.get_mut(&coord) {
            Some(record) if record.revision == revision => {
                record.needs_create = false;
                record.needs_update = false;
                true
            }
            Some(record) => {
                // Resource now exists; the newer mesh is an update
                if record.needs_create {
                    record.needs_create = false;
                    record.needs_update = true;
                }
                false
            }
            None => false,
        }
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        let (resident, pending) = self.shards.iter().fold((0, 0), |(r, p), s| {
            let s = s.read();
            (r + s.chunks.len(), p + s.pending.len())
        });
        WorldStats {
            resident,
            pending,
            generated: self.counters.generated.load(Ordering::Relaxed),
            removed: self.counters.removed.load(Ordering::Relaxed),
            redundant_skipped: self.counters.redundant_skipped.load(Ordering::Relaxed),
            remeshes: self.counters.remeshes.load(Ordering::Relaxed),
            edits: self.counters.edits.load(Ordering::Relaxed),
        }
    }
}
