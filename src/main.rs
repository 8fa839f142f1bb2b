//! CLI entry point for the transit data pipeline.
//!
//! Provides subcommands for the read API server, the realtime aggregator
//! and the daily schedule bundler. The two workers run one-shot for
//! external schedulers or on an in-process cadence.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gtfs_pipeline::config::Config;
use gtfs_pipeline::store::{KvStore, RedisStore};
use gtfs_pipeline::{api, realtime, schedule};
use log::info;

#[derive(Parser)]
#[command(name = "gtfs_pipeline")]
#[command(about = "Schedule bundler, realtime aggregator and read API for a commuter rail feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the read API over the shared key-value store
    Serve {
        /// Address to bind, overriding BIND_ADDR
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run the realtime aggregator
    Realtime {
        /// Seconds between runs
        #[arg(short, long, default_value_t = 120)]
        interval: u64,

        /// Run a single cycle and exit
        #[arg(long, default_value_t = false)]
        once: bool,
    },
    /// Run the daily schedule bundler
    Schedule {
        /// Seconds between runs
        #[arg(short, long, default_value_t = 86_400)]
        interval: u64,

        /// Run a single cycle and exit
        #[arg(long, default_value_t = false)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let store: Arc<dyn KvStore> = Arc::new(RedisStore::connect(&config.redis_url)?);

    match cli.command {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            info!("read api listening on {addr}");
            api::run_server(store, &addr).await?;
        }
        Commands::Realtime { interval, once } => {
            if once {
                realtime::worker::run(&config, store.as_ref()).await;
            } else {
                info!("realtime aggregator sampling every {interval}s");
                // Sequential await keeps at most one run in flight.
                loop {
                    realtime::worker::run(&config, store.as_ref()).await;
                    tokio::time::sleep(Duration::from_secs(interval)).await;
                }
            }
        }
        Commands::Schedule { interval, once } => {
            if once {
                schedule::worker::run(&config, store.as_ref()).await;
            } else {
                info!("schedule bundler running every {interval}s");
                loop {
                    schedule::worker::run(&config, store.as_ref()).await;
                    tokio::time::sleep(Duration::from_secs(interval)).await;
                }
            }
        }
    }

    Ok(())
}
