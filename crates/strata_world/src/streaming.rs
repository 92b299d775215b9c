//! # Streaming Scheduler
//!
//! Keeps the resident set centered on the observer. A dedicated thread
//! ticks at a fixed rate, independent of the render frame rate, reads the
//! observer position and calls `World::update_chunks`. All admission and
//! eviction logic lives in the world; the scheduler only owns the timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;
use strata_procedural::ChunkCoord;

use crate::error::{StrataError, StrataResult};
use crate::queue::RequestQueue;
use crate::world::World;

/// The square of chunk coordinates within `radius` of `center`,
/// nearest rings first.
#[must_use]
pub fn desired_region(center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
    let r = i32::try_from(radius).unwrap_or(i32::MAX / 2);
    let side = (2 * radius as usize) + 1;
    let mut coords = Vec::with_capacity(side * side);
    for dz in -r..=r {
        for dx in -r..=r {
            coords.push(center.offset(dx, dz));
        }
    }
    coords.sort_by_key(|c| (c.chebyshev(center), c.z, c.x));
    coords
}

/// Observer position shared between the player and the scheduler.
#[derive(Debug, Default)]
pub struct ObserverPosition {
    xz: Mutex<(f64, f64)>,
}

impl ObserverPosition {
    /// Creates a position.
    #[must_use]
    pub fn new(x: f64, z: f64) -> Self {
        Self { xz: Mutex::new((x, z)) }
    }

    /// Moves the observer.
    pub fn set(&self, x: f64, z: f64) {
        *self.xz.lock() = (x, z);
    }

    /// Current `(x, z)`.
    #[must_use]
    pub fn get(&self) -> (f64, f64) {
        *self.xz.lock()
    }
}

/// Fixed-rate driver of `World::update_chunks`.
pub struct StreamingScheduler {
    world: Arc<World>,
    observer: Arc<ObserverPosition>,
    admit: Arc<RequestQueue>,
    evict: Arc<RequestQueue>,
    radius: u32,
    period: Duration,
}

impl StreamingScheduler {
    /// Creates a scheduler ticking `tick_hz` times per second.
    #[must_use]
    pub fn new(
        world: Arc<World>,
        observer: Arc<ObserverPosition>,
        admit: Arc<RequestQueue>,
        evict: Arc<RequestQueue>,
        radius: u32,
        tick_hz: u32,
    ) -> Self {
        Self {
            world,
            observer,
            admit,
            evict,
            radius,
            period: Duration::from_secs(1) / tick_hz.max(1),
        }
    }

    /// Runs one tick on the calling thread.
    pub fn tick(&self) {
        let (x, z) = self.observer.get();
        let report = self
            .world
            .update_chunks(x, z, self.radius, &self.admit, &self.evict);
        tracing::trace!(
            cx = report.center.x,
            cz = report.center.z,
            admitted = report.admitted,
            deferred = report.deferred,
            evicted = report.evicted,
            "streaming tick"
        );
    }

    /// Starts the timer thread.
    ///
    /// # Errors
    ///
    /// Returns `ThreadSpawn` if the OS refuses the thread.
    pub fn spawn(self) -> StrataResult<SchedulerHandle> {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let ticks = Arc::new(AtomicU64::new(0));
        let thread_ticks = Arc::clone(&ticks);
        let name = "strata-scheduler".to_owned();

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                tracing::info!(period_ms = self.period.as_millis() as u64, "scheduler started");
                let timer = tick(self.period);
                loop {
                    select! {
                        recv(timer) -> _ => {
                            self.tick();
                            thread_ticks.fetch_add(1, Ordering::Relaxed);
                        }
                        recv(stop_rx) -> _ => break,
                    }
                }
                tracing::info!("scheduler stopped");
            })
            .map_err(|source| StrataError::ThreadSpawn { name, source })?;

        Ok(SchedulerHandle {
            stop: Some(stop_tx),
            thread: Some(thread),
            ticks,
        })
    }
}

/// Running scheduler thread. Dropping it stops the thread.
pub struct SchedulerHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Ticks completed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Stops the timer and waits for the in-flight tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects `stop_rx`, which wakes the select
        drop(self.stop.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("scheduler thread panicked");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
