mod args;
mod validators;

use anyhow::{Context, Result};
use args::Args;
use tms_tile_downloader::{fetch, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let dry_run = args.dry_run;
    let config = Config::try_from(args).context("invalid configuration")?;

    if dry_run {
        for (zoom, units) in config.range.plan(config.sequential) {
            let tiles: u64 = units.iter().map(|unit| unit.tile_count()).sum();
            eprintln!("zoom {:>2}: {:>12} tiles, {:>2} workers", zoom, tiles, units.len());
        }

        let tile_count = config.range.tile_count();
        eprintln!(
            "would download {} tiles (approx {}, assuming 10 kb per tile)",
            tile_count,
            pretty_bytes::converter::convert((tile_count as f64) * 10_000f64)
        );

        return Ok(());
    }

    fetch(config).await.context("failed fetching tiles")?;

    Ok(())
}
