//! # Terrain Scenario Tests
//!
//! Column structure of generated chunks at the default 16x32x16 size.

use strata_procedural::{Block, ChunkCoord, ChunkDims, TerrainConfig, TerrainGenerator};

fn scenario_generator(seed: u64) -> TerrainGenerator {
    let config = TerrainConfig {
        seed,
        sea_level: 0.3,
        max_terrain_height: 0.6,
        ..TerrainConfig::default()
    };
    TerrainGenerator::new(ChunkDims::new(16, 32, 16), config)
}

/// Test: Every column of chunk (0,0) is rock, soil, surface, then water or air.
#[test]
fn test_column_structure_origin_chunk() {
    for seed in [1u64, 42, 9_001] {
        let gen = scenario_generator(seed);
        let dims = gen.dims();
        let sea_level = gen.sea_level();
        let grid = gen.generate(ChunkCoord::new(0, 0));

        for z in 0..dims.size_z {
            for x in 0..dims.size_x {
                let sample = gen.column(x as i32, z as i32);
                let fh = sample.final_height;
                let surface = sample.biome.params.surface;

                assert_eq!(
                    grid.get(x, fh, z),
                    surface,
                    "Surface missing at ({x}, {fh}, {z}) seed {seed}"
                );

                for y in 0..fh.saturating_sub(4) {
                    assert_eq!(grid.get(x, y, z), Block::ROCK, "Expected rock at ({x}, {y}, {z})");
                }
                for y in fh.saturating_sub(4)..fh {
                    assert_eq!(
                        grid.get(x, y, z),
                        sample.biome.params.soil,
                        "Expected soil at ({x}, {y}, {z})"
                    );
                }

                // Above the surface: water up to sea level, possibly replaced by canopy
                for y in (fh + 1)..dims.size_y {
                    let block = grid.get(x, y, z);
                    let vegetation = block == Block::TRUNK || block == Block::LEAVES;
                    if y <= sea_level {
                        assert!(
                            block == Block::WATER || vegetation,
                            "Expected water at ({x}, {y}, {z}), got {block:?}"
                        );
                    } else {
                        assert!(
                            block.is_air() || vegetation,
                            "Expected air at ({x}, {y}, {z}), got {block:?}"
                        );
                    }
                }
            }
        }
    }
}

/// Test: Exactly one surface-id voxel at the surface height when no tree touches the column.
#[test]
fn test_single_surface_voxel_per_column() {
    let gen = scenario_generator(77);
    let dims = gen.dims();
    let grid = gen.generate(ChunkCoord::new(0, 0));

    for z in 0..dims.size_z {
        for x in 0..dims.size_x {
            let sample = gen.column(x as i32, z as i32);
            let surface = sample.biome.params.surface;
            if surface == sample.biome.params.soil {
                // Desert columns use sand for both layers
                continue;
            }
            let count = (0..dims.size_y).filter(|&y| grid.get(x, y, z) == surface).count();
            assert_eq!(count, 1, "Column ({x}, {z}) has {count} surface voxels");
        }
    }
}

/// Test: Chunks generated in any order are identical.
#[test]
fn test_generation_order_independent() {
    let gen = scenario_generator(5);
    let coords: Vec<_> = (-2..=2)
        .flat_map(|x| (-2..=2).map(move |z| ChunkCoord::new(x, z)))
        .collect();

    let forward: Vec<_> = coords.iter().map(|&c| gen.generate(c)).collect();
    let backward: Vec<_> = coords.iter().rev().map(|&c| gen.generate(c)).collect();

    for (i, grid) in forward.iter().enumerate() {
        assert_eq!(grid, &backward[coords.len() - 1 - i], "Mismatch at {:?}", coords[i]);
    }
}

/// Test: Negative chunk coordinates produce terrain too.
#[test]
fn test_negative_chunks_have_ground() {
    let gen = scenario_generator(3);
    for coord in [ChunkCoord::new(-1, -1), ChunkCoord::new(-100, 57)] {
        let grid = gen.generate(coord);
        for z in 0..16 {
            for x in 0..16 {
                assert!(!grid.get(x, 0, z).is_air(), "Void column at {coord:?} ({x}, {z})");
            }
        }
    }
}
