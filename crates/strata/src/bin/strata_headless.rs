//! # STRATA Headless
//!
//! Streams a world around a scripted observer walk with no window and no
//! GPU. A counting backend takes the place of the renderer so upload and
//! release traffic shows up in the logs.
//!
//! ```bash
//! # Defaults, 10 second walk
//! ./strata_headless
//!
//! # Custom config and duration, verbose registry logs
//! RUST_LOG=strata_world=debug ./strata_headless --config world.toml --seconds 30
//! ```

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use strata_meshing::ChunkMesh;
use strata_procedural::ChunkCoord;
use strata_world::{
    ObserverPosition, Pipeline, RenderBackend, ResourceTable, StrataResult, WorldConfig,
};
use tracing::{info, warn};

/// Simulated frame rate of the render loop.
const FRAME_RATE: u32 = 60;

/// Observer speed in blocks per second.
const WALK_SPEED: f64 = 24.0;

/// Parsed command line.
#[derive(Debug, Default)]
struct CliOptions {
    config: Option<String>,
    seconds: Option<u64>,
}

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Self {
        let mut options = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => options.config = args.next(),
                "--seconds" => {
                    options.seconds = args.next().and_then(|v| v.parse().ok());
                }
                other => warn!(arg = other, "ignoring unknown argument"),
            }
        }
        options
    }
}

/// Stand-in renderer: tracks live handles and bytes uploaded.
#[derive(Debug, Default)]
struct CountingBackend {
    next_id: u64,
    live: usize,
    uploaded_bytes: usize,
}

impl RenderBackend for CountingBackend {
    type Handle = u64;

    fn create(&mut self, _coord: ChunkCoord, mesh: &ChunkMesh) -> u64 {
        self.next_id += 1;
        self.live += 1;
        self.uploaded_bytes += mesh.vertex_bytes().len() + mesh.index_bytes().len();
        self.next_id
    }

    fn update(&mut self, _handle: &mut u64, mesh: &ChunkMesh) {
        self.uploaded_bytes += mesh.vertex_bytes().len() + mesh.index_bytes().len();
    }

    fn destroy(&mut self, _handle: u64) {
        self.live -= 1;
    }
}

/// Position along a slow spiral out from the origin.
fn walk(elapsed: Duration) -> (f64, f64) {
    let t = elapsed.as_secs_f64();
    let distance = WALK_SPEED * t;
    let angle = t * 0.25;
    (distance * angle.cos(), distance * angle.sin())
}

fn run(options: &CliOptions) -> StrataResult<()> {
    let config = match &options.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    let duration = Duration::from_secs(options.seconds.unwrap_or(10));

    let observer = Arc::new(ObserverPosition::new(0.0, 0.0));
    let pipeline = Pipeline::start(&config, Arc::clone(&observer))?;
    let world = Arc::clone(pipeline.world());
    let releases = Arc::clone(pipeline.releases());
    let mut table = ResourceTable::new(CountingBackend::default());

    let frame = Duration::from_secs(1) / FRAME_RATE;
    let start = Instant::now();
    let mut last_report = start;
    let mut frames = 0u64;

    while start.elapsed() < duration {
        let (x, z) = walk(start.elapsed());
        observer.set(x, z);

        let report = table.sync(&world, &releases);
        if report.created + report.updated + report.destroyed > 0 {
            tracing::trace!(
                created = report.created,
                updated = report.updated,
                destroyed = report.destroyed,
                "frame sync"
            );
        }

        frames += 1;
        if last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();
            let stats = world.stats();
            let admission = pipeline.admission_metrics();
            info!(
                x = x as i64,
                z = z as i64,
                resident = stats.resident,
                pending = stats.pending,
                handles = table.len(),
                admission_depth = admission.depth,
                admission_dropped = admission.dropped,
                eviction_depth = pipeline.eviction_metrics().depth,
                "streaming"
            );
        }

        thread::sleep(frame);
    }

    pipeline.shutdown();
    table.sync(&world, &releases);

    let stats = world.stats();
    info!(
        frames,
        generated = stats.generated,
        removed = stats.removed,
        remeshes = stats.remeshes,
        redundant_skipped = stats.redundant_skipped,
        uploaded_kib = table.backend().uploaded_bytes / 1024,
        live_handles = table.backend().live,
        "walk finished"
    );
    table.clear();
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting strata_headless v{}", env!("CARGO_PKG_VERSION"));

    let options = CliOptions::parse(env::args().skip(1));
    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "strata_headless failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_options() {
        let options = CliOptions::parse(args(&["--config", "w.toml", "--seconds", "3"]));
        assert_eq!(options.config.as_deref(), Some("w.toml"));
        assert_eq!(options.seconds, Some(3));

        let options = CliOptions::parse(args(&["--seconds", "soon"]));
        assert_eq!(options.seconds, None);
    }

    #[test]
    fn test_walk_starts_at_origin() {
        assert_eq!(walk(Duration::ZERO), (0.0, 0.0));
        let (x, z) = walk(Duration::from_secs(4));
        assert!((x.hypot(z) - 4.0 * WALK_SPEED).abs() < 1e-9);
    }
}
