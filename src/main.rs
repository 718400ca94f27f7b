//! cratever - look up the latest published version of a crate
//!
//! Queries the crates.io registry and caches the response on disk, so
//! repeat lookups are fast and keep working when the registry is slow,
//! rate-limited, or unreachable.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cratever::cache::{CacheCell, RefreshError};
use cratever::cli::{validate_crate_name, Cli};
use cratever::registry::{CrateInfo, RegistryClient};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    validate_crate_name(&cli.name)?;

    let client = RegistryClient::new()?;
    let name = cli.name.clone();
    let refresher = move || {
        let client = client.clone();
        let name = name.clone();
        async move { client.fetch_crate(&name).await.map_err(RefreshError::from) }
    };

    let mut cell = CacheCell::new(format!("{}.json", cli.name), refresher).with_ttl(cli.ttl());
    if let Some(seed) = cli.seed.clone() {
        cell = cell.with_bootstrap(seed);
    }

    if cli.clear_cache {
        cell.clear().await;
        return Ok(());
    }

    let info = cell.read().await?;
    print_info(&info, cli.json)?;

    Ok(())
}

/// Prints the crate info in either human-readable or JSON form
fn print_info(info: &CrateInfo, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
    } else {
        println!("{} {}", info.name, info.latest_version);
        if let Some(description) = &info.description {
            println!("  {}", description);
        }
        println!("  downloads: {}", info.downloads);
        println!("  updated:   {}", info.updated_at.format("%Y-%m-%d"));
    }
    Ok(())
}
