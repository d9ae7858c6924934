//! Pre-populate an offline TMS/XYZ tile cache from a remote tile service.
//!
//! **Use with absolute caution.** Downloading tiles en-masse can hog
//! down a tile server easily. Check the usage policy of the server first.
//!
//! Tiles are stored as `{output}/{z}/{x}/{y}.png`. Each zoom level is split
//! into column ranges that are downloaded in parallel, and a zoom level is
//! finished completely before the next one starts. Tiles already on disk are
//! skipped, so an interrupted run can be resumed by starting it again.
//!
//! # Usage
//!
//! The `tms-tile-downloader` binary reads a `config.properties` file:
//!
//! ```text
//! download.url=https://tile.example.org/{z}/{x}/{y}.png
//! download.path=./tiles
//! download.zoomStart=0
//! download.zoomEnd=8
//! ```
//!
//! Every key can be overridden on the command line, see `--help`.
//!
//! # Library Example
//! ```rust,no_run
//! use tms_tile_downloader::{fetch, Config, Properties};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let props = Properties::load("config.properties")?;
//! let config = Config::from_properties(&props)?;
//!
//! let stats = fetch(config).await?;
//! println!("{} tiles in {:?}", stats.downloaded, stats.elapsed);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod fetch;
mod partition;
mod source;
mod stats;
mod store;
mod tile;
mod url;

pub use config::{
    Config, Properties, PATH_KEY, SINGLE_THREAD_KEY, URL_KEY, X_END_KEY, X_START_KEY, Y_END_KEY,
    Y_START_KEY, ZOOM_END_KEY, ZOOM_START_KEY,
};
pub use error::{ConfigError, Error, FetchError, TileError, WriteError};
pub use fetch::{fetch, Downloader};
pub use partition::{partition, worker_count, DownloadRange, WorkUnit, MAX_WORKERS};
pub use source::{HttpSource, TileSource};
pub use stats::RunStatistics;
pub use store::{TileStore, WriteOutcome};
pub use tile::{tiles_per_axis, Tile, MAX_ZOOM};
pub use url::{Transport, UrlFormat};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_zoom_level_is_covered_once() {
        let range = DownloadRange {
            zoom_start: 3,
            zoom_end: 7,
            x_start: 5,
            y_start: 2,
            x_end: 100,
            y_end: 60,
        };

        for (zoom, units) in range.plan(false) {
            let mut seen = std::collections::HashSet::new();
            for tile in units.iter().flat_map(WorkUnit::tiles) {
                assert_eq!(tile.z, zoom);
                assert!(tile.x < tiles_per_axis(zoom) && tile.y < tiles_per_axis(zoom));
                assert!(seen.insert(tile), "{} assigned twice", tile);
            }
            assert_eq!(seen.len() as u64, units.iter().map(WorkUnit::tile_count).sum::<u64>());
        }
    }

    #[test]
    fn sequential_plan_matches_parallel_plan() {
        let range = DownloadRange {
            x_start: 3,
            y_start: 4,
            x_end: 9,
            y_end: 1,
            ..DownloadRange::full(3, 4)
        };

        let tiles = |sequential| -> Vec<Tile> {
            range
                .plan(sequential)
                .flat_map(|(_, units)| units)
                .flat_map(|unit| unit.tiles().collect::<Vec<_>>())
                .collect()
        };

        assert_eq!(tiles(true), tiles(false));
    }
}
