// ABOUTME: Queue commands for trainsync-cli
// ABOUTME: Handles list, enqueue and sync operations on pending writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use crate::PayloadKind;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use trainsync::config::SyncConfig;
use trainsync::connectivity::ReachabilityProbe;
use trainsync::models::{Mutation, NewExercise, NewTrainingPlan, TrainingSessionRecord};
use trainsync::queue::SyncOutcome;
use trainsync::remote::http_client::shared_client;
use trainsync::sync_service::OfflineSync;

/// Print pending writes as JSON
pub async fn list(sync: &OfflineSync) -> Result<()> {
    let pending = sync.queue().pending().await;
    println!("{}", serde_json::to_string_pretty(&pending)?);
    info!(pending = pending.len(), "Listed pending writes");
    Ok(())
}

/// Read a payload file and queue it
pub async fn enqueue(sync: &OfflineSync, kind: PayloadKind, file: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading payload file {}", file.display()))?;

    let mutation: Mutation = match kind {
        PayloadKind::Exercise => serde_json::from_str::<NewExercise>(&raw)?.into(),
        PayloadKind::Plan => serde_json::from_str::<NewTrainingPlan>(&raw)?.into(),
        PayloadKind::Session => serde_json::from_str::<TrainingSessionRecord>(&raw)?.into(),
    };
    mutation.validate()?;

    let record = sync.queue().enqueue(mutation).await;
    if !sync.queue().is_durable() {
        warn!("Write is queued in memory only; storage is not accepting writes");
    }
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Replay the queue once
pub async fn sync(sync: &OfflineSync, config: &SyncConfig, force: bool) -> Result<()> {
    if !force {
        let probe = ReachabilityProbe::new(
            shared_client().clone(),
            config.api.base_url.clone(),
            Duration::ZERO,
        );
        if !probe.check_once().await {
            warn!(url = %config.api.base_url, "Backend unreachable, nothing sent");
            println!(
                "Backend unreachable; {} writes still pending.",
                sync.queue().len().await
            );
            return Ok(());
        }
    }

    match sync.sync_now().await {
        SyncOutcome::AlreadyRunning => println!("A sync pass is already running."),
        SyncOutcome::Completed(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
