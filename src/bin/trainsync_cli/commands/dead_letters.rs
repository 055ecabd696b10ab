// ABOUTME: Dead-letter commands for trainsync-cli
// ABOUTME: Lists, requeues and discards writes the backend rejected
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 trainsync contributors

use anyhow::Result;
use trainsync::models::MutationId;
use trainsync::sync_service::OfflineSync;

/// Print dead letters as JSON
pub async fn list(sync: &OfflineSync) -> Result<()> {
    let letters = sync.queue().dead_letters().await;
    println!("{}", serde_json::to_string_pretty(&letters)?);
    Ok(())
}

/// Move a dead letter back to the queue tail
pub async fn requeue(sync: &OfflineSync, id: &str) -> Result<()> {
    let record = sync
        .queue()
        .requeue_dead_letter(&MutationId::from(id))
        .await?;
    println!("Requeued {} ({})", record.id, record.kind());
    Ok(())
}

/// Drop a dead letter
pub async fn discard(sync: &OfflineSync, id: &str) -> Result<()> {
    let letter = sync
        .queue()
        .discard_dead_letter(&MutationId::from(id))
        .await?;
    println!(
        "Discarded {} ({}): {}",
        letter.mutation.id,
        letter.mutation.kind(),
        letter.reason
    );
    Ok(())
}
