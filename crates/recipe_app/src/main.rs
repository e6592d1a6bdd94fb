//! Recipe crawler binary: loads configuration and the store snapshot, then
//! either crawls until Ctrl-C or reprocesses a single target.
mod app;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use crawl_logging::crawl_info;
use recipe_core::TargetId;

use crate::config::{AppConfig, DEFAULT_CONFIG_FILENAME};

#[derive(Debug, Parser)]
#[command(name = "recipe_crawler", version, about = "Polite per-host recipe crawler")]
struct Cli {
    /// RON configuration file; defaults are used when it does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_FILENAME)]
    config: PathBuf,

    /// Extra URL to enqueue before crawling. May be repeated.
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Reprocess one target immediately and exit instead of crawling.
    #[arg(long, value_name = "TARGET_ID")]
    process: Option<TargetId>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, found) = AppConfig::load(&cli.config)?;
    crawl_logging::initialize(
        config.log_destination.into(),
        config.level_filter()?,
        &config.log_file,
    );
    if !found {
        crawl_info!("No config at {}, using defaults", cli.config.display());
    }

    let crawler = app::Crawler::start(&config, &cli.seeds).await?;
    match cli.process {
        Some(target_id) => crawler.process_one(target_id).await,
        None => crawler.crawl_until_interrupted().await,
    }
}
