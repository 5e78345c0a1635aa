//! Dialogue session storage and per-conversation locking
//!
//! Storage backends:
//! - `InMemoryDialogueStore` - Default, uses HashMap; lost on restart
//!
//! Turns for the same conversation are serialized with [`ConversationLocks`];
//! different conversations proceed concurrently.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, OwnedMutexGuard};

use crate::state::DialogueState;
use crate::AgentError;

/// Conversation id → dialogue state
#[async_trait]
pub trait DialogueSessionStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<DialogueState>, AgentError>;

    async fn put(&self, id: &str, state: DialogueState) -> Result<(), AgentError>;

    async fn delete(&self, id: &str) -> Result<(), AgentError>;

    /// List all conversation ids with stored state
    async fn list_ids(&self) -> Result<Vec<String>, AgentError>;

    /// Drop sessions untouched for longer than `idle`; returns how many
    async fn remove_idle(&self, idle: Duration) -> Result<usize, AgentError>;

    /// Number of stored sessions
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct StoredSession {
    state: DialogueState,
    last_activity: Instant,
}

#[derive(Default)]
pub struct InMemoryDialogueStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl InMemoryDialogueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DialogueSessionStore for InMemoryDialogueStore {
    async fn get(&self, id: &str) -> Result<Option<DialogueState>, AgentError> {
        Ok(self.sessions.read().get(id).map(|s| s.state.clone()))
    }

    async fn put(&self, id: &str, state: DialogueState) -> Result<(), AgentError> {
        self.sessions.write().insert(
            id.to_string(),
            StoredSession {
                state,
                last_activity: Instant::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AgentError> {
        self.sessions.write().remove(id);
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>, AgentError> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn remove_idle(&self, idle: Duration) -> Result<usize, AgentError> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.last_activity.elapsed() <= idle);
        Ok(before - sessions.len())
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }
}

/// One async mutex per active conversation id
///
/// Entries are removed when the last holder releases and nobody is waiting.
#[derive(Default)]
pub struct ConversationLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`
    pub async fn acquire(&self, id: &str) -> ConversationGuard<'_> {
        let mutex = self.locks.entry(id.to_string()).or_default().clone();
        let guard = mutex.lock_owned().await;
        ConversationGuard {
            locks: &self.locks,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of ids currently locked or awaited
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

pub struct ConversationGuard<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ConversationGuard<'_> {
    fn drop(&mut self) {
        // Release first so our Arc no longer counts
        self.guard.take();
        self.locks
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Periodically remove idle sessions
///
/// Returns a shutdown sender; send `true` to stop the task.
pub fn spawn_idle_sweeper(
    store: Arc<dyn DialogueSessionStore>,
    idle: Duration,
    interval: Duration,
) -> watch::Sender<bool> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(interval);
        interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval_timer.tick() => {
                    match store.remove_idle(idle).await {
                        Ok(0) => {}
                        Ok(removed) => tracing::info!(
                            removed,
                            remaining = store.len(),
                            "Removed idle dialogue sessions"
                        ),
                        Err(e) => tracing::warn!(error = %e, "Idle session sweep failed"),
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Idle session sweeper shutting down");
                        break;
                    }
                }
            }
        }
    });

    shutdown_tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PendingCommand;

    #[tokio::test]
    async fn test_in_memory_store_roundtrip() {
        let store = InMemoryDialogueStore::new();
        assert!(store.get("a").await.unwrap().is_none());

        let state = DialogueState::AwaitingConfirmation(PendingCommand::DeleteSale { id: 3 });
        store.put("a", state.clone()).await.unwrap();
        store.put("b", DialogueState::Idle).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(state));
        assert_eq!(store.list_ids().await.unwrap(), vec!["a", "b"]);
        assert_eq!(store.len(), 2);

        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_idle() {
        let store = InMemoryDialogueStore::new();
        store.put("old", DialogueState::Idle).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        store.put("fresh", DialogueState::Idle).await.unwrap();

        let removed = store.remove_idle(Duration::from_millis(20)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.list_ids().await.unwrap(), vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_locks_serialize_same_id() {
        let locks = Arc::new(ConversationLocks::new());
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let first = locks.acquire("t1").await;
        let waiter = {
            let locks = locks.clone();
            let order = order.clone();
            tokio::spawn(async move {
                let _g = locks.acquire("t1").await;
                order.lock().push("second");
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        order.lock().push("first");
        drop(first);
        waiter.await.unwrap();

        assert_eq!(*order.lock(), vec!["first", "second"]);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_locks_independent_ids() {
        let locks = ConversationLocks::new();
        let _a = locks.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b")).await;
        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let store: Arc<dyn DialogueSessionStore> = Arc::new(InMemoryDialogueStore::new());
        store.put("x", DialogueState::Idle).await.unwrap();

        let shutdown = spawn_idle_sweeper(
            store.clone(),
            Duration::from_millis(1),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.is_empty());
        shutdown.send(true).unwrap();
    }
}
