use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use fairline::config::Config;
use fairline::feed::FileSource;
use fairline::pipeline::{self, JsonlSink};

/// Evaluate one odds snapshot and print EV records as JSON lines.
///
/// Usage: fairline <snapshot.json> [config.toml]
///
/// Without a config argument, `config.toml` in the working directory is used
/// if present, otherwise the built-in defaults.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let snapshot_path = args
        .next()
        .context("usage: fairline <snapshot.json> [config.toml]")?;

    let config = match args.next() {
        Some(path) => Config::load(Path::new(&path))?,
        None => {
            let default_path = Path::new("config.toml");
            if default_path.exists() {
                Config::load(default_path)?
            } else {
                Config::default()
            }
        }
    };

    let source = FileSource::load(Path::new(&snapshot_path))?;
    let sports = source.sports();
    if sports.is_empty() {
        tracing::warn!("snapshot contains no events");
        return Ok(());
    }

    let mut sink = JsonlSink::stdout();
    let summary = pipeline::run(&config, &source, &mut sink, &sports).await?;

    tracing::info!(
        sports = summary.sports.len(),
        records = summary.records,
        "run complete"
    );
    Ok(())
}
