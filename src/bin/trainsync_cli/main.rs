// ABOUTME: trainsync CLI for inspecting and replaying the offline mutation queue
// ABOUTME: Lists, enqueues and syncs pending writes and manages dead letters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors
//!
//! Usage:
//! ```bash
//! # Show pending writes
//! trainsync-cli list
//!
//! # Queue a training plan read from a JSON file
//! trainsync-cli enqueue plan --file plan.json
//!
//! # Replay the queue if the backend is reachable
//! trainsync-cli sync
//!
//! # Inspect and resolve rejected writes
//! trainsync-cli dead-letters list
//! trainsync-cli dead-letters requeue 1718000000000-0a1b2c3d
//! trainsync-cli dead-letters discard 1718000000000-0a1b2c3d
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trainsync::config::{StorageBackend, SyncConfig};
use trainsync::logging::LoggingConfig;
use trainsync::sync_service::OfflineSync;

#[derive(Parser)]
#[command(
    name = "trainsync-cli",
    about = "Offline mutation queue CLI",
    long_about = "Inspect, extend and replay the durable queue of fitness writes made while offline."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Backend base URL override
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Storage backend override (memory, file, sqlite)
    #[arg(long, global = true)]
    storage: Option<String>,

    /// Data directory override
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Print pending writes in replay order
    List,

    /// Queue a write for later delivery
    Enqueue {
        /// Kind of write
        #[arg(value_enum)]
        kind: PayloadKind,

        /// JSON file holding the payload
        #[arg(long)]
        file: PathBuf,
    },

    /// Replay pending writes once
    Sync {
        /// Skip the reachability check
        #[arg(long)]
        force: bool,
    },

    /// Dead letter management
    DeadLetters {
        #[command(subcommand)]
        action: DeadLetterCommand,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum DeadLetterCommand {
    /// Print dead letters, oldest first
    List,

    /// Move a dead letter back to the end of the queue
    Requeue {
        /// Mutation id
        id: String,
    },

    /// Drop a dead letter for good
    Discard {
        /// Mutation id
        id: String,
    },
}

/// Payload shapes accepted by `enqueue`
#[derive(Clone, Copy, ValueEnum)]
pub enum PayloadKind {
    /// New exercise (multipart on replay)
    Exercise,
    /// New training plan
    Plan,
    /// Completed training session
    Session,
}

fn apply_overrides(cli: &Cli, config: &mut SyncConfig) {
    if let Some(url) = &cli.api_url {
        config.api.base_url.clone_from(url);
    }
    if let Some(storage) = &cli.storage {
        config.storage.backend = StorageBackend::from_str_or_default(storage);
    }
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir.clone_from(dir);
    }
    // One-shot commands check reachability themselves
    config.connectivity.probe_interval = None;
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging.level = "debug".into();
    }
    logging.init()?;

    let mut config = SyncConfig::from_env()?;
    apply_overrides(&cli, &mut config);
    let sync = OfflineSync::from_config(&config).await?;

    match cli.command {
        Command::List => commands::queue::list(&sync).await?,
        Command::Enqueue { kind, file } => commands::queue::enqueue(&sync, kind, &file).await?,
        Command::Sync { force } => commands::queue::sync(&sync, &config, force).await?,
        Command::DeadLetters { action } => match action {
            DeadLetterCommand::List => commands::dead_letters::list(&sync).await?,
            DeadLetterCommand::Requeue { id } => {
                commands::dead_letters::requeue(&sync, &id).await?;
            }
            DeadLetterCommand::Discard { id } => {
                commands::dead_letters::discard(&sync, &id).await?;
            }
        },
    }

    sync.shutdown().await;
    Ok(())
}
