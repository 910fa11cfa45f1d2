//! Command-line interface for the fetcher.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::client::OsmClient;
use crate::config::{FetcherConfig, ResolveMode, DEFAULT_WAY_ID};
use crate::error::Result;

/// OSM Fetcher - Fetch OpenStreetMap ways and resolve their nodes.
#[derive(Parser)]
#[command(name = "osm-fetcher")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the environment.
#[derive(Args, Debug, Default)]
pub struct GlobalOptions {
    /// API base URL (default: $OSM_API_BASE_URL or the public OSM API)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Retries for connection errors and 5xx responses (default: 0)
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Maximum number of node fetches in flight
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,

    /// Deadline in seconds for resolving all nodes of a way
    #[arg(long, global = true)]
    pub deadline_secs: Option<u64>,

    /// Skip nodes that fail to fetch instead of failing the whole run
    #[arg(long, global = true)]
    pub best_effort: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a way and all of its nodes as OSM-JSON.
    Resolve {
        /// Way identifier
        #[arg(default_value_t = DEFAULT_WAY_ID)]
        way_id: i64,
    },

    /// Fetch a single way.
    Way {
        /// Way identifier
        id: i64,
    },

    /// Fetch a single node.
    Node {
        /// Node identifier
        id: i64,
    },
}

impl GlobalOptions {
    /// Apply the flags on top of a base configuration.
    pub fn apply(&self, mut config: FetcherConfig) -> FetcherConfig {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(limit) = self.max_concurrency {
            config.resolve.max_concurrency = Some(limit);
        }
        if let Some(secs) = self.deadline_secs {
            config.resolve.deadline = Some(Duration::from_secs(secs));
        }
        if self.best_effort {
            config.resolve.mode = ResolveMode::BestEffort;
        }
        config
    }
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.options.apply(FetcherConfig::from_env()?);
    config.validate()?;

    let client = OsmClient::new(&config)?;
    tracing::info!(base_url = client.gateway().base_url(), "Using OSM API");

    match cli.command {
        Commands::Resolve { way_id } => print_json(&client.fetch_way_set(way_id).await?),
        Commands::Way { id } => print_json(&client.fetch_way(id).await?),
        Commands::Node { id } => print_json(&client.fetch_node(id).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
