//! # STRATA World
//!
//! Chunk registry and streaming pipeline.
//!
//! ## Architecture
//!
//! - `World`: sharded registry of resident chunks. Block edits, chunk
//!   generation and removal, remeshing against neighbor snapshots.
//! - `RequestQueue`: bounded coalescing queues between the scheduler and
//!   the worker pool.
//! - `StreamingScheduler`: fixed-rate thread keeping the resident set
//!   centered on the observer.
//! - `WorkerPool`: generation and deletion threads.
//! - `ResourceTable`: render-thread side-table of GPU handles, driven by
//!   dirty flags and `ChunkRelease` notices.
//! - `Pipeline`: all of the above, started from a `WorldConfig`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strata_world::{ObserverPosition, Pipeline, WorldConfig};
//!
//! let observer = Arc::new(ObserverPosition::new(0.0, 0.0));
//! let pipeline = Pipeline::start(&WorldConfig::default(), Arc::clone(&observer))?;
//! observer.set(120.0, -40.0);
//! // ... render frames, `ResourceTable::sync` each frame ...
//! pipeline.shutdown();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod queue;
pub mod render;
pub mod streaming;
pub mod workers;
pub mod world;

mod record;

pub use config::{StreamingConfig, WorldConfig, MAX_STREAMING_RADIUS};
pub use error::{StrataError, StrataResult};
pub use pipeline::Pipeline;
pub use queue::{ChunkRelease, Offer, OverflowPolicy, QueueMetrics, ReleaseQueue, RequestQueue};
pub use record::{ChunkView, DirtyChunk};
pub use render::{RenderBackend, ResourceTable, SyncReport};
pub use streaming::{desired_region, ObserverPosition, SchedulerHandle, StreamingScheduler};
pub use workers::WorkerPool;
pub use world::{NeighborSet, UpdateReport, World, WorldStats, SHARD_COUNT};
