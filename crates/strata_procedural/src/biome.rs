//! # Biome Table
//!
//! Maps a biome-noise value in ~[-1, 1] to terrain parameters.
//!
//! Bands are ordered from swamp (lowest) to snow (highest). Between two
//! pure bands the height factors are blended with a smoothstep weight,
//! while the surface/soil blocks are picked from whichever side the
//! weight favors.

use crate::chunk::Block;

/// Biome types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Biome {
    /// Sandy lowlands.
    Desert = 0,
    /// Flat grassland.
    Plains = 1,
    /// Wooded hills.
    Forest = 2,
    /// High rocky peaks.
    Mountains = 3,
    /// Low wetland.
    Swamp = 4,
    /// Snow-covered highlands.
    Snow = 5,
}

impl Biome {
    /// Returns the terrain parameters of this biome.
    #[must_use]
    pub const fn params(self) -> BiomeParams {
        match self {
            Self::Desert => BiomeParams {
                min_height_factor: 0.4,
                max_height_factor: 0.6,
                surface: Block::new(8, [0.9, 0.8, 0.4]),
                soil: Block::new(8, [0.9, 0.8, 0.4]),
            },
            Self::Plains => BiomeParams {
                min_height_factor: 0.55,
                max_height_factor: 0.65,
                surface: Block::new(9, [0.4, 0.7, 0.1]),
                soil: Block::new(1, [0.45, 0.36, 0.2]),
            },
            Self::Forest => BiomeParams {
                min_height_factor: 0.55,
                max_height_factor: 0.75,
                surface: Block::new(2, [0.1, 0.8, 0.1]),
                soil: Block::new(1, [0.45, 0.36, 0.2]),
            },
            Self::Mountains => BiomeParams {
                min_height_factor: 0.7,
                max_height_factor: 2.3,
                surface: Block::new(10, [0.6, 0.6, 0.6]),
                soil: Block::new(3, [0.5, 0.5, 0.5]),
            },
            Self::Swamp => BiomeParams {
                min_height_factor: 0.25,
                max_height_factor: 0.5,
                surface: Block::new(11, [0.2, 0.4, 0.1]),
                soil: Block::new(1, [0.3, 0.25, 0.1]),
            },
            Self::Snow => BiomeParams {
                min_height_factor: 0.6,
                max_height_factor: 1.2,
                surface: Block::new(12, [1.0, 1.0, 1.0]),
                soil: Block::new(3, [0.6, 0.6, 0.6]),
            },
        }
    }

    /// Returns whether this biome grows trees.
    #[must_use]
    pub const fn has_trees(self) -> bool {
        matches!(self, Self::Plains | Self::Forest)
    }
}

/// Height range and column blocks of a biome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeParams {
    /// Height factor applied where the terrain noise is lowest.
    pub min_height_factor: f64,
    /// Height factor applied where the terrain noise is highest.
    pub max_height_factor: f64,
    /// Block placed at the column top.
    pub surface: Block,
    /// Block placed in the four layers below the surface.
    pub soil: Block,
}

/// Biome parameters resolved for one column, possibly blended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnBiome {
    /// The biome whose blocks were picked.
    pub dominant: Biome,
    /// The column lies in a transition band between two biomes.
    pub blended: bool,
    /// Blended parameters.
    pub params: BiomeParams,
}

impl ColumnBiome {
    fn pure(biome: Biome) -> Self {
        Self {
            dominant: biome,
            blended: false,
            params: biome.params(),
        }
    }

    fn blend(a: Biome, b: Biome, t: f64) -> Self {
        let pa = a.params();
        let pb = b.params();
        let dominant = if t < 0.5 { a } else { b };
        let picked = dominant.params();
        Self {
            dominant,
            blended: true,
            params: BiomeParams {
                min_height_factor: lerp(pa.min_height_factor, pb.min_height_factor, t),
                max_height_factor: lerp(pa.max_height_factor, pb.max_height_factor, t),
                surface: picked.surface,
                soil: picked.soil,
            },
        }
    }

    /// Returns whether trees may grow here. Transition bands stay bare.
    #[inline]
    #[must_use]
    pub const fn has_trees(&self) -> bool {
        !self.blended && self.dominant.has_trees()
    }

    /// Height factor for a normalized terrain-noise value.
    #[inline]
    #[must_use]
    pub fn height_factor(&self, norm: f64) -> f64 {
        lerp(self.params.min_height_factor, self.params.max_height_factor, norm)
    }
}

/// Resolves a biome-noise value to column parameters.
#[must_use]
pub fn pick_biome(v: f64) -> ColumnBiome {
    match v {
        v if v < -0.7 => ColumnBiome::pure(Biome::Swamp),
        v if v < -0.5 => ColumnBiome::blend(Biome::Swamp, Biome::Desert, smoothstep(-0.7, -0.5, v)),
        v if v < -0.2 => ColumnBiome::blend(Biome::Desert, Biome::Plains, smoothstep(-0.5, -0.2, v)),
        v if v < 0.0 => ColumnBiome::pure(Biome::Plains),
        v if v < 0.3 => ColumnBiome::blend(Biome::Plains, Biome::Forest, smoothstep(0.0, 0.3, v)),
        v if v < 0.5 => ColumnBiome::pure(Biome::Forest),
        v if v < 0.7 => ColumnBiome::blend(Biome::Forest, Biome::Mountains, smoothstep(0.5, 0.7, v)),
        v if v < 0.8 => ColumnBiome::pure(Biome::Mountains),
        v if v < 0.9 => ColumnBiome::blend(Biome::Mountains, Biome::Snow, smoothstep(0.8, 0.9, v)),
        _ => ColumnBiome::pure(Biome::Snow),
    }
}

/// Linear interpolation.
#[inline]
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Hermite smoothstep of `x` between two edges, clamped to [0, 1].
#[inline]
#[must_use]
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
