//! # World Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an
//! empty file is a valid config:
//!
//! ```toml
//! [chunk]
//! size_x = 16
//! size_y = 32
//! size_z = 16
//!
//! [terrain]
//! seed = 1234
//! sea_level = 0.3
//! max_terrain_height = 0.6
//!
//! [streaming]
//! radius = 6
//! tick_hz = 12
//! boundary = "open"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_meshing::BoundaryPolicy;
use strata_procedural::{ChunkDims, TerrainConfig};

use crate::error::{StrataError, StrataResult};

/// Largest accepted `streaming.radius`. The desired square holds
/// `(2 * radius + 1)^2` coordinates and is rebuilt every tick.
pub const MAX_STREAMING_RADIUS: u32 = 1024;

/// Streaming pipeline parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chunks kept resident in each direction around the observer's chunk.
    pub radius: u32,
    /// Scheduler ticks per second.
    pub tick_hz: u32,
    /// Admission queue capacity.
    pub admission_capacity: usize,
    /// Free slots the admission queue keeps; requests are skipped once
    /// depth reaches `admission_capacity - admission_headroom`.
    pub admission_headroom: usize,
    /// Eviction queue capacity. Offers block rather than drop when full.
    pub eviction_capacity: usize,
    /// Generation worker threads.
    pub generation_workers: usize,
    /// Deletion worker threads.
    pub deletion_workers: usize,
    /// Meshing rule for borders with a missing neighbor.
    pub boundary: BoundaryPolicy,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            radius: 6,
            tick_hz: 12,
            admission_capacity: 100,
            admission_headroom: 1,
            eviction_capacity: 65_536,
            generation_workers: 16,
            deletion_workers: 16,
            boundary: BoundaryPolicy::Open,
        }
    }
}

/// Complete world configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Per-chunk dimensions.
    pub chunk: ChunkDims,
    /// Terrain shaping.
    pub terrain: TerrainConfig,
    /// Streaming pipeline.
    pub streaming: StreamingConfig,
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` for malformed TOML and `InvalidConfig` for
    /// out-of-range values.
    pub fn from_toml_str(source: &str) -> StrataResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigRead` if the file cannot be read, otherwise as
    /// [`WorldConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| StrataError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks every value the core treats as a precondition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> StrataResult<()> {
        let invalid = |field: &'static str, reason: &str| {
            Err(StrataError::InvalidConfig {
                field,
                reason: reason.to_owned(),
            })
        };

        if self.chunk.size_x == 0 || self.chunk.size_y == 0 || self.chunk.size_z == 0 {
            return invalid("chunk", "chunk dimensions must be non-zero");
        }
        if i32::try_from(self.chunk.size_x).is_err()
            || i32::try_from(self.chunk.size_y).is_err()
            || i32::try_from(self.chunk.size_z).is_err()
        {
            return invalid("chunk", "chunk dimensions must fit in i32");
        }
        if !(0.0..=1.0).contains(&self.terrain.sea_level) {
            return invalid("terrain.sea_level", "must be a fraction in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.terrain.max_terrain_height) {
            return invalid("terrain.max_terrain_height", "must be a fraction in [0, 1]");
        }
        if self.terrain.warp_scale.is_nan() || self.terrain.warp_scale <= 0.0 {
            return invalid("terrain.warp_scale", "must be positive");
        }
        if !self.terrain.warp_amp.is_finite() {
            return invalid("terrain.warp_amp", "must be finite");
        }
        if !(0.0..=1.0).contains(&self.terrain.tree_chance) {
            return invalid("terrain.tree_chance", "must be a probability in [0, 1]");
        }
        if self.streaming.radius > MAX_STREAMING_RADIUS {
            return invalid("streaming.radius", "must be at most 1024");
        }
        if self.streaming.tick_hz == 0 {
            return invalid("streaming.tick_hz", "must be at least 1");
        }
        if self.streaming.admission_capacity <= self.streaming.admission_headroom {
            return invalid(
                "streaming.admission_capacity",
                "must exceed admission_headroom",
            );
        }
        if self.streaming.eviction_capacity == 0 {
            return invalid("streaming.eviction_capacity", "must be at least 1");
        }
        if self.streaming.generation_workers == 0 || self.streaming.deletion_workers == 0 {
            return invalid("streaming", "worker pools need at least one thread each");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = WorldConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.chunk, ChunkDims::new(16, 32, 16));
        assert_eq!(config.streaming.tick_hz, 12);
        assert_eq!(config.streaming.admission_capacity, 100);
    }

    #[test]
    fn test_partial_sections() {
        let config = WorldConfig::from_toml_str(
            r#"
            [chunk]
            size_y = 64

            [terrain]
            seed = 99
            warp_amp = 5.0

            [streaming]
            radius = 2
            boundary = "sealed"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.chunk, ChunkDims::new(16, 64, 16));
        assert_eq!(config.terrain.seed, 99);
        assert!((config.terrain.warp_amp - 5.0).abs() < f64::EPSILON);
        assert!((config.terrain.sea_level - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.streaming.radius, 2);
        assert_eq!(config.streaming.boundary, BoundaryPolicy::Sealed);
    }

    #[test]
    fn test_rejects_oversized_radius() {
        let err = WorldConfig::from_toml_str("[streaming]\nradius = 4000000000\n").unwrap_err();
        assert!(
            matches!(err, StrataError::InvalidConfig { field: "streaming.radius", .. }),
            "{err}"
        );

        let at_limit = format!("[streaming]\nradius = {MAX_STREAMING_RADIUS}\n");
        assert!(WorldConfig::from_toml_str(&at_limit).is_ok());
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let err = WorldConfig::from_toml_str("[chunk]\nsize_x = 0\n").unwrap_err();
        assert!(matches!(err, StrataError::InvalidConfig { field: "chunk", .. }), "{err}");
    }

    #[test]
    fn test_rejects_out_of_range_fraction() {
        let err = WorldConfig::from_toml_str("[terrain]\nsea_level = 1.5\n").unwrap_err();
        assert!(
            matches!(err, StrataError::InvalidConfig { field: "terrain.sea_level", .. }),
            "{err}"
        );
    }

    #[test]
    fn test_rejects_headroom_above_capacity() {
        let err = WorldConfig::from_toml_str(
            "[streaming]\nadmission_capacity = 2\nadmission_headroom = 2\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("admission_capacity"), "{err}");
    }

    #[test]
    fn test_parse_error() {
        let err = WorldConfig::from_toml_str("[chunk\n").unwrap_err();
        assert!(matches!(err, StrataError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = WorldConfig::load("/nonexistent/strata.toml").unwrap_err();
        assert!(matches!(err, StrataError::ConfigRead { .. }));
    }
}
