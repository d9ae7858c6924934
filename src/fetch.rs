use std::sync::Arc;

use futures::future;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::error::Error;
use crate::partition::{DownloadRange, WorkUnit};
use crate::source::{HttpSource, TileSource};
use crate::stats::{Counters, RunStatistics};
use crate::store::{TileStore, WriteOutcome};
use crate::tile::{Tile, MAX_ZOOM};

/// Asynchronously fetch the tiles specified in `cfg` and save them to the
/// file system.
///
/// Creates the required directories recursively. Tiles that already exist are
/// not fetched again, so an interrupted run can simply be restarted.
///
/// # Example
/// ```rust,no_run
/// use tms_tile_downloader::{fetch, Config, DownloadRange, UrlFormat};
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = Config {
///     url: UrlFormat::from_string("https://tile.example.org/{z}/{x}/{y}.png".into()),
///     output_folder: "./tiles".into(),
///     range: DownloadRange::full(0, 6),
///     sequential: false,
///     progress: true,
/// };
///
/// let stats = fetch(config).await.expect("failed fetching tiles");
/// println!("downloaded {} tiles", stats.downloaded);
/// # }
/// ```
pub async fn fetch(cfg: Config) -> Result<RunStatistics, Error> {
    let output_folder = cfg.output_folder.as_path();

    if output_folder.exists() && !output_folder.is_dir() {
        return Err(Error::OutputNotDirectory(output_folder.to_path_buf()));
    }

    fs::create_dir_all(output_folder)
        .await
        .map_err(|source| Error::CreateOutput {
            path: output_folder.to_path_buf(),
            source,
        })?;

    let source = HttpSource::new(cfg.url)?;
    let downloader = Downloader::new(source, TileStore::new(cfg.output_folder), cfg.range)
        .sequential(cfg.sequential)
        .progress(cfg.progress);

    Ok(downloader.run().await)
}

/// Downloads a [`DownloadRange`] one zoom level at a time.
///
/// Every zoom level is partitioned into [`WorkUnit`]s, each of which is swept
/// by its own task. All tasks of a zoom level finish before the next level
/// starts. A task that fails to fetch or write a tile stops its own unit but
/// leaves its siblings running.
pub struct Downloader<S> {
    source: Arc<S>,
    store: TileStore,
    range: DownloadRange,
    sequential: bool,
    progress: bool,
}

impl<S> Downloader<S>
where
    S: TileSource + 'static,
{
    /// # Panics
    /// Panics if `range.zoom_end` exceeds [`MAX_ZOOM`]. [`Config`] never holds
    /// such a range.
    pub fn new(source: S, store: TileStore, range: DownloadRange) -> Self {
        assert!(
            range.zoom_end <= MAX_ZOOM,
            "zoom level {} out of range",
            range.zoom_end
        );

        Self {
            source: Arc::new(source),
            store,
            range,
            sequential: false,
            progress: false,
        }
    }

    /// Hand every zoom level to a single worker.
    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    /// Draw a progress bar for every zoom level.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self) -> RunStatistics {
        let counters = Arc::new(Counters::new());

        for (zoom, units) in self.range.plan(self.sequential) {
            self.download_zoom(zoom, units, &counters).await;
        }

        let stats = counters.snapshot();
        info!(
            downloaded = stats.downloaded,
            skipped = stats.skipped,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "finished zoom {}-{}",
            self.range.zoom_start,
            self.range.zoom_end,
        );
        match stats.average_per_tile() {
            Some(avg) => info!("average time per tile: {:?}", avg),
            None => info!("no tiles were downloaded"),
        }
        if !stats.is_complete() {
            warn!(
                failed_workers = stats.failed_workers,
                "some workers stopped early, the cache is incomplete"
            );
        }

        stats
    }

    async fn download_zoom(&self, zoom: u8, units: Vec<WorkUnit>, counters: &Arc<Counters>) {
        let tile_count: u64 = units.iter().map(WorkUnit::tile_count).sum();
        let downloaded_before = counters.downloaded();
        info!(workers = units.len(), tiles = tile_count, "zoom {}", zoom);

        let pb = self.progress_bar(zoom, tile_count);

        let handles: Vec<_> = units
            .into_iter()
            .map(|unit| {
                debug!("x {}..={} assigned", unit.x_start, unit.x_end);
                let worker = Worker {
                    source: Arc::clone(&self.source),
                    store: self.store.clone(),
                    counters: Arc::clone(counters),
                    progress: pb.clone(),
                };
                let span = info_span!("worker", zoom, x_start = unit.x_start, x_end = unit.x_end);

                tokio::spawn(worker.sweep(unit).instrument(span))
            })
            .collect();

        for result in future::join_all(handles).await {
            match result {
                Ok(Sweep::Completed) => {}
                Ok(Sweep::Stopped(tile)) => {
                    warn!("worker stopped at tile {}", tile);
                    counters.record_failed_worker();
                }
                Err(e) => {
                    error!("worker at zoom {} panicked: {}", zoom, e);
                    counters.record_failed_worker();
                }
            }
        }

        pb.finish_and_clear();
        info!(
            downloaded = counters.downloaded() - downloaded_before,
            "zoom {} done", zoom
        );
    }

    fn progress_bar(&self, zoom: u8, len: u64) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template(
            "z{prefix:<2} [{elapsed_precise}] {bar:60.cyan/blue} {pos:>7}/{len:7} ETA: {eta} {msg}",
        ) {
            pb.set_style(style.progress_chars("##-"));
        }
        pb.set_prefix(zoom.to_string());

        pb
    }
}

/// How a worker's sweep ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Sweep {
    Completed,
    /// Stopped at this tile; the rest of the unit was not attempted.
    Stopped(Tile),
}

struct Worker<S> {
    source: Arc<S>,
    store: TileStore,
    counters: Arc<Counters>,
    progress: ProgressBar,
}

impl<S> Worker<S>
where
    S: TileSource + 'static,
{
    async fn sweep(self, unit: WorkUnit) -> Sweep {
        for tile in unit.tiles() {
            let source = &self.source;
            let outcome = self
                .store
                .write_if_absent(&tile, || source.fetch(tile))
                .await;
            self.progress.inc(1);

            match outcome {
                Ok(WriteOutcome::Written) => {
                    debug!("download: {}", self.store.path_of(&tile).display());
                    self.counters.record_download();
                }
                Ok(WriteOutcome::Skipped) => {
                    debug!("exist: {}", self.store.path_of(&tile).display());
                    self.counters.record_skip();
                }
                Err(e) => {
                    error!(
                        "failed tile {}, abandoning the rest of x {}..={}: {:#}",
                        tile,
                        unit.x_start,
                        unit.x_end,
                        anyhow::Error::new(e),
                    );
                    return Sweep::Stopped(tile);
                }
            }
        }

        Sweep::Completed
    }
}
