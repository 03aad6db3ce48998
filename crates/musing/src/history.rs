// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `musing history` command implementation.
//!
//! Reads the timeline straight from the configured store. With the
//! process-local `memory` backend a fresh process always sees an empty history.

use std::time::Duration;

use musing_config::model::MusingConfig;
use musing_core::{GeneratedItem, MusingError};
use musing_engine::{Keys, Timeline};

/// Run the `musing history` command.
pub async fn run_history(
    config: &MusingConfig,
    limit: usize,
    offset: usize,
    json: bool,
) -> Result<(), MusingError> {
    let Some(store) = musing_store::open_store(&config.store).await? else {
        println!("no store available; history is empty");
        return Ok(());
    };

    let timeline = Timeline::new(
        store,
        Keys::new(config.store.key_prefix.clone()),
        config.generation.timeline_cap,
        Duration::from_secs(config.store.item_ttl_secs),
    );
    let total = timeline.total().await?;
    let items = if limit == 0 {
        Vec::new()
    } else {
        timeline.range(offset, limit).await?
    };

    if json {
        let body = serde_json::json!({
            "items": items,
            "total": total,
            "limit": limit,
            "offset": offset,
        });
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| MusingError::Internal(format!("failed to encode history: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    if items.is_empty() {
        println!("no items (total {total})");
        return Ok(());
    }
    for item in &items {
        println!("{}", format_item(item));
    }
    println!("showing {}-{} of {total}", offset + 1, offset + items.len());
    Ok(())
}

/// One human-readable block per item.
fn format_item(item: &GeneratedItem) -> String {
    let a = &item.attributes;
    format!(
        "{}  {} / {} / {}\n  {}\n",
        item.created_at.format("%Y-%m-%d %H:%M:%S"),
        a.flavor.label(),
        a.tone,
        a.intensity,
        item.text
    )
}
