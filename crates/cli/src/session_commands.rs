use std::{sync::Arc, time::Duration};

use {chrono::DateTime, tracing::warn};

use {donna_conversations::ConversationService, donna_sessions::SessionStore};

fn format_ms(ms: u64) -> String {
    DateTime::from_timestamp_millis(ms as i64)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Print all known sessions.
pub async fn list(sessions: &SessionStore) {
    let mut entries = sessions.list().await;
    if entries.is_empty() {
        println!("No sessions.");
        return;
    }
    entries.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
    for entry in entries {
        println!(
            "{}  thread={}  created={}  last_used={}",
            entry.user_id,
            entry.thread_id,
            format_ms(entry.created_at),
            format_ms(entry.last_used_at),
        );
    }
}

/// Remove sessions idle longer than `ttl`, deleting their remote threads too.
///
/// A failed remote deletion is logged, not fatal — the local mapping is
/// already gone and the service expires orphaned threads on its own.
pub async fn sweep(
    sessions: &SessionStore,
    service: Arc<dyn ConversationService>,
    ttl: Duration,
) -> anyhow::Result<()> {
    let swept = sessions.sweep_idle(ttl).await?;
    if swept.is_empty() {
        println!("Nothing to sweep.");
        return Ok(());
    }

    for entry in &swept {
        if let Err(e) = service.delete_thread(&entry.thread_id).await {
            warn!(thread_id = %entry.thread_id, error = %e, "failed to delete remote thread");
        }
    }
    println!("Swept {} idle session(s).", swept.len());
    Ok(())
}
