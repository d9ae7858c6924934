use std::future::Future;

use futures::prelude::*;
use tracing::debug;

use crate::error::{Error, FetchError};
use crate::tile::Tile;
use crate::url::{Transport, UrlFormat};

/// Somewhere tiles can be fetched from.
///
/// Each call performs exactly one attempt; failures are not retried.
pub trait TileSource: Send + Sync {
    fn fetch(&self, tile: Tile) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Fetches tiles over HTTP(S) using a URL template.
#[derive(Debug)]
pub struct HttpSource {
    url: UrlFormat,
    client: reqwest::Client,
}

impl HttpSource {
    /// Creates a source for `url`. Templates starting with `https` get a client
    /// that refuses to talk plain HTTP, including on redirects.
    pub fn new(url: UrlFormat) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(format!("tms-tile-downloader/{}", env!("CARGO_PKG_VERSION")));

        if url.transport() == Transport::Secure {
            builder = builder.https_only(true);
        }

        let client = builder.build().map_err(Error::Client)?;

        Ok(Self { url, client })
    }
}

impl TileSource for HttpSource {
    async fn fetch(&self, tile: Tile) -> Result<Vec<u8>, FetchError> {
        let url = self.url.tile_url(&tile);
        debug!(%url, "requesting tile {}", tile);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(source) => return Err(FetchError::Request { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let mut body = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) => body.extend_from_slice(&chunk),
                Err(source) => return Err(FetchError::Body { url, source }),
            }
        }

        Ok(body)
    }
}
