mod batch;
mod commands;
mod config;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;

use courier_store::S3Store;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "courier", about = "Ships audio through the OLIVE pipeline")]
struct Cli {
    /// YAML config with the bucket, credentials and engine settings.
    #[arg(long, env = "COURIER_CONFIG", default_value = "aws_config.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload audio files and register them in the status ledger.
    Upload {
        /// A single audio file, or a directory scanned for .flac/.wav/.mp3.
        #[arg(long)]
        path: PathBuf,
    },
    /// Run the engine over every pending file and publish the results.
    Process,
    /// Wait for files to finish processing and download their results.
    Fetch {
        /// Filelist written by a previous upload run.
        #[arg(long)]
        filelist: PathBuf,

        /// Seconds between ledger polls.
        #[arg(long, default_value_t = 5)]
        poll_interval: u64,

        /// Give up after this many seconds; unset waits forever.
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let store = S3Store::new(config.s3()).await;

    match cli.command {
        Command::Upload { path } => commands::upload::run(&config, store, &path).await,
        Command::Process => commands::process::run(&config, store).await,
        Command::Fetch {
            filelist,
            poll_interval,
            timeout,
        } => {
            commands::fetch::run(
                &config,
                store,
                &filelist,
                Duration::from_secs(poll_interval),
                timeout.map(Duration::from_secs),
            )
            .await
        }
    }
}
