//! # Streaming Pipeline
//!
//! Wires the pieces together for a running world:
//!
//! ```text
//! observer ─► scheduler ─► admission queue ─► generation workers ─┐
//!                 │                                                ├─► World
//!                 └──────► eviction queue  ─► deletion workers ───┘
//!                                                   │
//!                                                   └─► ReleaseQueue ─► render thread
//! ```
//!
//! Shutdown stops the scheduler before the workers. A blocked eviction
//! offer is only released by a deletion worker, so the workers must
//! outlive the last tick.

use std::sync::Arc;

use crate::config::WorldConfig;
use crate::error::StrataResult;
use crate::queue::{QueueMetrics, ReleaseQueue, RequestQueue};
use crate::streaming::{ObserverPosition, SchedulerHandle, StreamingScheduler};
use crate::workers::WorkerPool;
use crate::world::World;

/// A world with its scheduler and worker threads running.
pub struct Pipeline {
    world: Arc<World>,
    observer: Arc<ObserverPosition>,
    admit: Arc<RequestQueue>,
    evict: Arc<RequestQueue>,
    releases: Arc<ReleaseQueue>,
    scheduler: Option<SchedulerHandle>,
    workers: Option<WorkerPool>,
}

impl Pipeline {
    /// Builds an empty world from `config` and starts streaming around
    /// `observer`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` fails validation and
    /// `ThreadSpawn` if a thread cannot be started.
    pub fn start(config: &WorldConfig, observer: Arc<ObserverPosition>) -> StrataResult<Self> {
        config.validate()?;
        let streaming = &config.streaming;

        let world = Arc::new(World::from_config(config));
        let admit = Arc::new(RequestQueue::admission(
            streaming.admission_capacity,
            streaming.admission_headroom,
        ));
        let evict = Arc::new(RequestQueue::eviction(streaming.eviction_capacity));
        let releases = Arc::new(ReleaseQueue::new());

        let workers = WorkerPool::spawn(
            &world,
            &admit,
            &evict,
            &releases,
            streaming.generation_workers,
            streaming.deletion_workers,
        )?;
        let scheduler = StreamingScheduler::new(
            Arc::clone(&world),
            Arc::clone(&observer),
            Arc::clone(&admit),
            Arc::clone(&evict),
            streaming.radius,
            streaming.tick_hz,
        )
        .spawn()?;

        tracing::info!(
            radius = streaming.radius,
            tick_hz = streaming.tick_hz,
            seed = config.terrain.seed,
            "streaming pipeline started"
        );

        Ok(Self {
            world,
            observer,
            admit,
            evict,
            releases,
            scheduler: Some(scheduler),
            workers: Some(workers),
        })
    }

    /// The shared world.
    #[must_use]
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// The observer the scheduler follows.
    #[must_use]
    pub fn observer(&self) -> &Arc<ObserverPosition> {
        &self.observer
    }

    /// Releases for the render thread to drain.
    #[must_use]
    pub fn releases(&self) -> &Arc<ReleaseQueue> {
        &self.releases
    }

    /// Admission queue counters.
    #[must_use]
    pub fn admission_metrics(&self) -> QueueMetrics {
        self.admit.metrics()
    }

    /// Eviction queue counters.
    #[must_use]
    pub fn eviction_metrics(&self) -> QueueMetrics {
        self.evict.metrics()
    }

    /// Scheduler ticks completed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.scheduler.as_ref().map_or(0, SchedulerHandle::ticks)
    }

    /// Stops the scheduler, then drains and joins the workers.
    ///
    /// The world stays readable through any `Arc` obtained from
    /// [`Pipeline::world`].
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop();
        }
        if let Some(workers) = self.workers.take() {
            workers.shutdown();
            let stats = self.world.stats();
            tracing::info!(
                resident = stats.resident,
                generated = stats.generated,
                removed = stats.removed,
                "streaming pipeline stopped"
            );
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
