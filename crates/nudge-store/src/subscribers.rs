//! Durable subscriber set — a JSON array of Telegram chat ids.
//!
//! Every mutation persists the full set. A failed write is logged and the
//! in-memory change is kept; there is no transactional guarantee between
//! memory and disk.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Subscriber set persisted as `subscribers.json`.
pub struct SubscriberStore {
    subscribers: BTreeSet<i64>,
    path: PathBuf,
}

impl SubscriberStore {
    /// Open the store at the given file path, loading any existing set.
    /// A missing or corrupt file yields an empty set, never an error.
    pub fn open(path: PathBuf) -> Self {
        let subscribers = Self::load_file(&path);
        Self { subscribers, path }
    }

    fn load_file(path: &PathBuf) -> BTreeSet<i64> {
        if !path.exists() {
            return BTreeSet::new();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Vec<i64>>(&content) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    tracing::warn!("Corrupt subscriber file {}: {e}", path.display());
                    BTreeSet::new()
                }
            },
            Err(e) => {
                tracing::warn!("Cannot read {}: {e}", path.display());
                BTreeSet::new()
            }
        }
    }

    /// Re-read the set from disk.
    pub fn reload(&mut self) {
        self.subscribers = Self::load_file(&self.path);
    }

    /// Register a chat id. Returns false if it was already subscribed.
    pub fn add(&mut self, chat_id: i64) -> bool {
        let added = self.subscribers.insert(chat_id);
        if added {
            self.persist();
            tracing::info!("Chat {chat_id} subscribed ({} total)", self.subscribers.len());
        }
        added
    }

    /// Deregister a chat id. Returns false if it was not subscribed.
    pub fn remove(&mut self, chat_id: i64) -> bool {
        let removed = self.subscribers.remove(&chat_id);
        if removed {
            self.persist();
            tracing::info!("Chat {chat_id} unsubscribed ({} left)", self.subscribers.len());
        }
        removed
    }

    pub fn contains(&self, chat_id: i64) -> bool {
        self.subscribers.contains(&chat_id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Snapshot of the current set, for lock-free fan-out.
    pub fn snapshot(&self) -> Vec<i64> {
        self.subscribers.iter().copied().collect()
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Cannot create {}: {e}", parent.display());
                return;
            }
        }
        let ids: Vec<i64> = self.subscribers.iter().copied().collect();
        match serde_json::to_string_pretty(&ids) {
            Ok(content) => {
                if let Err(e) = std::fs::write(&self.path, content) {
                    tracing::warn!("Cannot persist {}: {e}", self.path.display());
                }
            }
            Err(e) => tracing::warn!("Cannot serialize subscriber set: {e}"),
        }
    }
}
