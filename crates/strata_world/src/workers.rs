//! # Worker Pool
//!
//! Named OS threads draining the request queues:
//! - generation workers call `World::generate_chunk`
//! - deletion workers call `World::remove_chunk` and forward releases
//!
//! Workers block on their queue and exit once it is closed and drained.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{StrataError, StrataResult};
use crate::queue::{ReleaseQueue, RequestQueue};
use crate::world::World;

/// Generation and deletion worker threads.
pub struct WorkerPool {
    admit: Arc<RequestQueue>,
    evict: Arc<RequestQueue>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `generation_workers` + `deletion_workers` threads.
    ///
    /// # Errors
    ///
    /// Returns `ThreadSpawn` if any thread fails to start; threads already
    /// started are shut down first.
    pub fn spawn(
        world: &Arc<World>,
        admit: &Arc<RequestQueue>,
        evict: &Arc<RequestQueue>,
        releases: &Arc<ReleaseQueue>,
        generation_workers: usize,
        deletion_workers: usize,
    ) -> StrataResult<Self> {
        let mut pool = Self {
            admit: Arc::clone(admit),
            evict: Arc::clone(evict),
            handles: Vec::with_capacity(generation_workers + deletion_workers),
        };

        for id in 0..generation_workers {
            let world = Arc::clone(world);
            let queue = Arc::clone(admit);
            pool.start(format!("strata-gen-{id}"), move || {
                while let Some(coord) = queue.recv() {
                    world.generate_chunk(coord);
                }
            })?;
        }

        for id in 0..deletion_workers {
            let world = Arc::clone(world);
            let queue = Arc::clone(evict);
            let releases = Arc::clone(releases);
            pool.start(format!("strata-del-{id}"), move || {
                while let Some(coord) = queue.recv() {
                    world.remove_chunk(coord, &releases);
                }
            })?;
        }

        tracing::info!(generation_workers, deletion_workers, "worker pool started");
        Ok(pool)
    }

    fn start<F>(&mut self, name: String, body: F) -> StrataResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(body)
            .map_err(|source| StrataError::ThreadSpawn { name, source })?;
        self.handles.push(handle);
        Ok(())
    }

    /// Number of running threads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if no threads are running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Closes both queues and joins every worker once they have drained.
    pub fn shutdown(mut self) {
        self.join_all();
    }

    fn join_all(&mut self) {
        self.admit.close();
        self.evict.close();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.join_all();
            tracing::info!("worker pool stopped");
        }
    }
}
