use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    dashmap::DashMap,
    serde::{Deserialize, Serialize},
    tokio::sync::Mutex,
    tracing::{debug, info},
};

use crate::{
    error::{Context, Error, Result},
    identity::normalize_user_id,
};

/// One user's conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub user_id: String,
    pub thread_id: String,
    /// Unix millis.
    pub created_at: u64,
    /// Unix millis, refreshed on every dispatch.
    pub last_used_at: u64,
}

/// JSON file-backed index mapping normalized user id → [`SessionEntry`].
///
/// `get_or_create_thread` holds a per-user lock across the whole
/// check-then-create sequence, so concurrent dispatches for one user observe
/// exactly one thread.
pub struct SessionStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, SessionEntry>>,
    creation_locks: DashMap<String, Arc<Mutex<()>>>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl SessionStore {
    /// Load the index from disk, or start empty.
    pub fn load(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read session index {}", path.display()))?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            creation_locks: DashMap::new(),
        })
    }

    fn persist(&self, entries: &HashMap<String, SessionEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, data)
            .with_context(|| format!("failed to write session index {}", self.path.display()))?;
        Ok(())
    }

    fn creation_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.creation_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Resolve the thread for a user, creating one via `create` on first use.
    ///
    /// On a hit the entry's `last_used_at` is refreshed. On a miss the
    /// factory runs under this user's creation lock, closing the
    /// read-then-write race between concurrent dispatches.
    pub async fn get_or_create_thread<F, Fut>(&self, user_id: &str, create: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<String>>,
    {
        let user_id = normalize_user_id(user_id)?;

        let lock = self.creation_lock(&user_id);
        let _guard = lock.lock().await;

        {
            let mut entries = self.entries.lock().await;
            if let Some(entry) = entries.get_mut(&user_id) {
                entry.last_used_at = now_ms();
                let thread_id = entry.thread_id.clone();
                self.persist(&entries)?;
                debug!(%user_id, %thread_id, "reusing session thread");
                return Ok(thread_id);
            }
        }

        let thread_id = create().await.map_err(Error::ThreadCreation)?;

        let mut entries = self.entries.lock().await;
        let now = now_ms();
        entries.insert(
            user_id.clone(),
            SessionEntry {
                user_id: user_id.clone(),
                thread_id: thread_id.clone(),
                created_at: now,
                last_used_at: now,
            },
        );
        self.persist(&entries)?;
        info!(%user_id, %thread_id, "created session thread");
        Ok(thread_id)
    }

    /// Look up a user's session without touching `last_used_at`.
    pub async fn get(&self, user_id: &str) -> Result<Option<SessionEntry>> {
        let user_id = normalize_user_id(user_id)?;
        Ok(self.entries.lock().await.get(&user_id).cloned())
    }

    /// All sessions, unordered.
    pub async fn list(&self) -> Vec<SessionEntry> {
        self.entries.lock().await.values().cloned().collect()
    }

    /// Remove a user's session, returning it if present.
    pub async fn remove(&self, user_id: &str) -> Result<Option<SessionEntry>> {
        let user_id = normalize_user_id(user_id)?;
        let mut entries = self.entries.lock().await;
        let removed = entries.remove(&user_id);
        if removed.is_some() {
            self.persist(&entries)?;
        }
        Ok(removed)
    }

    /// Remove every session idle for longer than `max_age` and return them.
    ///
    /// Deleting the remote thread is the caller's concern; the store only
    /// owns the mapping.
    pub async fn sweep_idle(&self, max_age: Duration) -> Result<Vec<SessionEntry>> {
        let cutoff = now_ms().saturating_sub(max_age.as_millis() as u64);
        let mut entries = self.entries.lock().await;
        let stale: Vec<String> = entries
            .values()
            .filter(|e| e.last_used_at < cutoff)
            .map(|e| e.user_id.clone())
            .collect();

        let mut swept = Vec::with_capacity(stale.len());
        for user_id in stale {
            if let Some(entry) = entries.remove(&user_id) {
                swept.push(entry);
            }
        }
        if !swept.is_empty() {
            self.persist(&entries)?;
            info!(count = swept.len(), "swept idle sessions");
        }
        Ok(swept)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::load(dir.path().join("sessions.json")).unwrap()
    }

    #[tokio::test]
    async fn creates_once_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let calls = AtomicUsize::new(0);

        let first = store
            .get_or_create_thread("U1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("thread_1".to_string())
            })
            .await
            .unwrap();
        let second = store
            .get_or_create_thread("U1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("thread_2".to_string())
            })
            .await
            .unwrap();

        assert_eq!(first, "thread_1");
        assert_eq!(second, "thread_1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn prefix_variants_share_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let a = store
            .get_or_create_thread("slack_U1", || async { Ok("thread_1".to_string()) })
            .await
            .unwrap();
        let b = store
            .get_or_create_thread("U1", || async { Ok("thread_other".to_string()) })
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_same_user_creates_exactly_one_thread() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir));
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |store: Arc<SessionStore>, calls: Arc<AtomicUsize>| async move {
            store
                .get_or_create_thread("U1", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    // Widen the race window: without the per-user lock both
                    // tasks would reach the factory.
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(format!("thread_{}", uuid_like()))
                })
                .await
        };

        let (a, b) = tokio::join!(
            make(store.clone(), calls.clone()),
            make(store.clone(), calls.clone())
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    fn uuid_like() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as u64
    }

    #[tokio::test]
    async fn reuse_refreshes_last_used() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .get_or_create_thread("U1", || async { Ok("thread_1".to_string()) })
            .await
            .unwrap();
        let before = store.get("U1").await.unwrap().unwrap().last_used_at;

        tokio::time::sleep(Duration::from_millis(5)).await;
        store
            .get_or_create_thread("U1", || async { Ok("unused".to_string()) })
            .await
            .unwrap();
        let after = store.get("U1").await.unwrap().unwrap().last_used_at;
        assert!(after > before, "last_used_at must advance on reuse");
    }

    #[tokio::test]
    async fn survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        {
            let store = SessionStore::load(path.clone()).unwrap();
            store
                .get_or_create_thread("U1", || async { Ok("thread_1".to_string()) })
                .await
                .unwrap();
        }

        let store = SessionStore::load(path).unwrap();
        let entry = store.get("U1").await.unwrap().unwrap();
        assert_eq!(entry.thread_id, "thread_1");
    }

    #[tokio::test]
    async fn sweep_removes_only_idle_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .get_or_create_thread("U1", || async { Ok("thread_1".to_string()) })
            .await
            .unwrap();
        store
            .get_or_create_thread("U2", || async { Ok("thread_2".to_string()) })
            .await
            .unwrap();

        // Nothing is older than an hour yet.
        let swept = store.sweep_idle(Duration::from_secs(3600)).await.unwrap();
        assert!(swept.is_empty());

        // With a zero TTL everything is stale.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let swept = store.sweep_idle(Duration::ZERO).await.unwrap();
        assert_eq!(swept.len(), 2);
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn factory_failure_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let err = store
            .get_or_create_thread("U1", || async { anyhow::bail!("service down") })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("thread creation failed"));

        // The next attempt must run the factory again.
        let ok = store
            .get_or_create_thread("U1", || async { Ok("thread_1".to_string()) })
            .await
            .unwrap();
        assert_eq!(ok, "thread_1");
    }
}
