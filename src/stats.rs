//! Job-wide download counters.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Counters shared by every worker of a job.
#[derive(Debug)]
pub(crate) struct Counters {
    started: Instant,
    downloaded: AtomicU64,
    skipped: AtomicU64,
    failed_workers: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            downloaded: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed_workers: AtomicU64::new(0),
        }
    }

    pub fn record_download(&self) {
        self.downloaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_worker(&self) {
        self.failed_workers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> RunStatistics {
        RunStatistics {
            downloaded: self.downloaded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed_workers: self.failed_workers.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }
}

/// The outcome of a download job.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunStatistics {
    /// Tiles fetched and written.
    pub downloaded: u64,
    /// Tiles that were already on disk.
    pub skipped: u64,
    /// Workers that stopped early on a fetch or write failure.
    pub failed_workers: u64,
    /// Wall-clock time of the whole job.
    pub elapsed: Duration,
}

impl RunStatistics {
    /// Average time spent per downloaded tile, `None` if nothing was downloaded.
    pub fn average_per_tile(&self) -> Option<Duration> {
        if self.downloaded == 0 {
            return None;
        }

        let per_tile = self.elapsed.as_nanos() / u128::from(self.downloaded);
        Some(Duration::from_nanos(u64::try_from(per_tile).unwrap_or(u64::MAX)))
    }

    pub fn is_complete(&self) -> bool {
        self.failed_workers == 0
    }
}
