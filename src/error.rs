use std::{io, path::PathBuf};

use reqwest::StatusCode;
use thiserror::Error;

/// A configuration value is missing, unparsable or out of range.
///
/// Always fatal: nothing is downloaded until the configuration validates.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed loading configuration from {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("missing required configuration key `{0}`")]
    Missing(String),

    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        key: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::Invalid {
            key: key.to_owned(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Fetching a single tile failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed requesting {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("received status {status} fetching {url}")]
    Status { url: String, status: StatusCode },

    #[error("failed reading response body of {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The URL the failing request was sent to.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Request { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. } => url,
        }
    }
}

/// Persisting a single tile failed.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed checking for an existing tile at {}", path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed creating tile directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed writing tile to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed moving finished tile into place at {}", path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    /// The path that could not be written.
    pub fn path(&self) -> &PathBuf {
        match self {
            WriteError::Inspect { path, .. }
            | WriteError::CreateDir { path, .. }
            | WriteError::Write { path, .. }
            | WriteError::Rename { path, .. } => path,
        }
    }
}

/// Any failure in the per-tile pipeline. Either one stops the worker that
/// hit it.
#[derive(Debug, Error)]
pub enum TileError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Job-level failures that prevent a download run from starting.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed creating HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("output {} exists and is not a directory", .0.display())]
    OutputNotDirectory(PathBuf),

    #[error("failed creating root output directory {}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
