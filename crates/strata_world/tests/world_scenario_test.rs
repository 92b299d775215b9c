//! # World Scenario Tests
//!
//! Block edits, cross-chunk face culling and render bookkeeping on a world
//! built from the default 16x32x16 config.

use strata_meshing::{BoundaryPolicy, ChunkMesher};
use strata_procedural::{Block, ChunkCoord, TerrainConfig, TerrainGenerator};
use strata_world::{ReleaseQueue, World, WorldConfig};

fn scenario_world(seed: u64) -> World {
    let mut config = WorldConfig::default();
    config.terrain = TerrainConfig {
        seed,
        ..TerrainConfig::default()
    };
    World::from_config(&config)
}

fn acknowledge_all(world: &World) {
    for dirty in world.dirty_chunks() {
        world.acknowledge_upload(dirty.coord, dirty.revision);
    }
}

/// Test: An edit on a chunk border remeshes the chunk across the border.
#[test]
fn test_border_edit_updates_both_chunks() {
    let world = scenario_world(11);
    let a = ChunkCoord::new(0, 0);
    let b = ChunkCoord::new(1, 0);
    world.generate_chunk(a);
    world.generate_chunk(b);
    acknowledge_all(&world);
    assert!(world.dirty_chunks().is_empty());

    // x = 15 is the last column of chunk (0, 0)
    world.set_block(15, 31, 0, Block::ROCK);

    let flags = |c| world.with_chunk(c, |v| (v.needs_create, v.needs_update)).expect("resident");
    assert_eq!(flags(a), (false, true));
    assert_eq!(flags(b), (false, true));
}

/// Test: Set then get returns the block; remove is set-air.
#[test]
fn test_edit_round_trip() {
    let world = scenario_world(12);
    world.generate_chunk(ChunkCoord::new(0, 0));
    world.generate_chunk(ChunkCoord::new(-1, -1));

    for (x, y, z) in [(0, 30, 0), (7, 1, 9), (-1, 31, -1), (-16, 0, -16)] {
        world.set_block(x, y, z, Block::WATER);
        assert_eq!(world.get_block(x, y, z), Block::WATER, "at ({x}, {y}, {z})");

        world.remove_block(x, y, z);
        assert!(world.get_block(x, y, z).is_air(), "at ({x}, {y}, {z})");
    }
    assert_eq!(world.stats().edits, 8);
}

/// Test: Negative world X resolves to the last column of chunk -1.
#[test]
fn test_negative_coordinate_resolution() {
    let world = scenario_world(13);
    let coord = ChunkCoord::new(-1, 0);
    world.generate_chunk(coord);
    let grid = world.generator().generate(coord);

    for y in 0..32 {
        assert_eq!(world.get_block(-1, y, 0), grid.get(15, y as usize, 0), "at y {y}");
        assert_eq!(world.get_block(-16, y, 15), grid.get(0, y as usize, 15), "at y {y}");
    }
    // Chunk (0, 0) is not resident
    assert!(world.get_block(0, 0, 0).is_air());
}

/// Test: Loading neighbors culls the buried border faces of a chunk.
#[test]
fn test_neighbors_cull_border_faces() {
    let world = scenario_world(14);
    let center = ChunkCoord::new(0, 0);
    world.generate_chunk(center);
    let isolated = world.with_chunk(center, |v| v.index_count()).expect("resident");

    for (_, neighbor) in center.neighbors() {
        world.generate_chunk(neighbor);
    }
    let surrounded = world.with_chunk(center, |v| v.mesh.clone()).expect("resident");
    assert!(
        surrounded.index_count() < isolated,
        "{} indices surrounded vs {isolated} isolated",
        surrounded.index_count()
    );

    // Same mesh as a fresh build against the same neighbors
    let voxels = world.voxels(center).expect("resident");
    let neighbors = world.collect_neighbors(center);
    let rebuilt = ChunkMesher::new(BoundaryPolicy::Open).build(&voxels, &neighbors.as_neighbors());
    assert_eq!(surrounded, rebuilt);
}

/// Test: A sealed border draws nothing toward a missing neighbor.
#[test]
fn test_sealed_boundary_draws_fewer_faces() {
    let gen = || TerrainGenerator::new(WorldConfig::default().chunk, TerrainConfig::default());
    let open = World::new(gen(), ChunkMesher::new(BoundaryPolicy::Open));
    let sealed = World::new(gen(), ChunkMesher::new(BoundaryPolicy::Sealed));
    let c = ChunkCoord::new(3, 3);
    open.generate_chunk(c);
    sealed.generate_chunk(c);

    let open_count = open.with_chunk(c, |v| v.index_count()).expect("resident");
    let sealed_count = sealed.with_chunk(c, |v| v.index_count()).expect("resident");
    assert!(sealed_count < open_count);
}

/// Test: Surface height follows edits.
#[test]
fn test_surface_height_tracks_edits() {
    let world = scenario_world(15);
    world.generate_chunk(ChunkCoord::new(0, 0));

    assert!(world.surface_height(4, 4).is_some());
    world.set_block(4, 31, 4, Block::ROCK);
    assert_eq!(world.surface_height(4, 4), Some(31));
    assert_eq!(world.surface_height(100, 100), None);
}

/// Test: Removed chunks read as air and post exactly one release.
#[test]
fn test_removed_chunk_reads_as_air() {
    let world = scenario_world(16);
    let releases = ReleaseQueue::new();
    let c = ChunkCoord::new(2, 2);
    world.generate_chunk(c);
    assert!(!world.get_block(32, 0, 32).is_air());

    assert!(world.remove_chunk(c, &releases));
    assert!(world.get_block(32, 0, 32).is_air());
    assert_eq!(releases.len(), 1);

    let stats = world.stats();
    assert_eq!((stats.generated, stats.removed, stats.resident), (1, 1, 0));
}
