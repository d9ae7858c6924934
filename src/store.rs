use std::{future::Future, path::PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{FetchError, TileError, WriteError};
use crate::tile::Tile;

/// What happened to a tile in [`TileStore::write_if_absent`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteOutcome {
    /// The tile was fetched and written.
    Written,
    /// The tile was already on disk; nothing was fetched.
    Skipped,
}

/// A directory tree of tiles laid out as `{root}/{z}/{x}/{y}.png`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, tile: &Tile) -> PathBuf {
        tile.path_in(&self.root)
    }

    /// Whether the tile is already on disk.
    ///
    /// A path that cannot be inspected is an error rather than "absent", so
    /// nothing is fetched for a tile that could not be written anyway.
    pub async fn contains(&self, tile: &Tile) -> Result<bool, WriteError> {
        let path = self.path_of(tile);

        match fs::try_exists(&path).await {
            Ok(exists) => Ok(exists),
            Err(source) => Err(WriteError::Inspect { path, source }),
        }
    }

    /// Stores the tile unless it already exists.
    ///
    /// `fetch` is only invoked when the tile is missing, so an interrupted job
    /// can be resumed without touching the network for tiles it already has.
    pub async fn write_if_absent<F, Fut>(
        &self,
        tile: &Tile,
        fetch: F,
    ) -> Result<WriteOutcome, TileError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, FetchError>>,
    {
        if self.contains(tile).await? {
            return Ok(WriteOutcome::Skipped);
        }

        let data = fetch().await?;
        self.write(tile, &data).await?;

        Ok(WriteOutcome::Written)
    }

    /// Writes `data` as the tile, replacing whatever is at the target path.
    ///
    /// The bytes go to a `.part` file next to the target first, so a tile that
    /// exists on disk is always complete. The `.part` file is removed again if
    /// the tile cannot be finished.
    pub async fn write(&self, tile: &Tile, data: &[u8]) -> Result<(), WriteError> {
        let path = self.path_of(tile);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| WriteError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let partial = path.with_extension("png.part");
        let result = match fs::write(&partial, data).await {
            Ok(()) => fs::rename(&partial, &path)
                .await
                .map_err(|source| WriteError::Rename { path, source }),
            Err(source) => Err(WriteError::Write {
                path: partial.clone(),
                source,
            }),
        };

        if result.is_err() {
            if let Err(e) = fs::remove_file(&partial).await {
                debug!("leaving {} behind: {}", partial.display(), e);
            }
        }

        result
    }
}
