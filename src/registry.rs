//! The session registry (§4.D): a map from session id to session, with
//! creation, lookup, listing, and removal. Grounded on
//! `gdb-session-manager.c` of the original implementation and on the
//! teacher's `ProcessRegistry` (`registry.rs`) for the `Arc<Mutex<HashMap<..>>>`
//! shape and the "lock held only for map operations" discipline.

use crate::error::GdbError;
use crate::session::GdbSession;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, Mutex};

/// Registry-level observation hooks for embedding hosts (§4.D), emitted
/// after the map mutation completes and outside the map lock.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    SessionAdded(String),
    SessionRemoved(String),
}

/// Hard cap on concurrently live sessions.
pub const MAX_SESSIONS: usize = 20;

/// Default command timeout applied to a session unless overridden per
/// `gdb_start` call.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Snapshot of one session's state, suitable for `gdb_list_sessions`.
pub struct SessionSummary {
    pub id: String,
    pub target_program: Option<String>,
    pub state: crate::enums::SessionState,
    pub working_dir: Option<String>,
}

/// Owns every live [`GdbSession`]. The map lock is held only for the
/// duration of map mutation/lookup, never across subprocess I/O -- callers
/// clone the `Arc<GdbSession>` out and release the lock before driving a
/// command.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<GdbSession>>>,
    counter: AtomicU64,
    default_gdb_path: String,
    events: broadcast::Sender<RegistryEvent>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(default_gdb_path: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            sessions: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
            default_gdb_path: default_gdb_path.into(),
            events,
        }
    }

    /// Subscribe to `session-added`/`session-removed` signals (§4.D),
    /// emitted after the map mutation, outside the map lock.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    fn next_id(&self) -> String {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros())
            .unwrap_or(0);
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{micros}-{seq}")
    }

    /// Create and start a new session. On startup failure the session is not
    /// inserted into the registry, matching the original's "create, attempt
    /// to start, remove on failure" sequence.
    pub async fn create_session(
        &self,
        gdb_path: Option<String>,
        working_dir: Option<String>,
        timeout_ms: Option<u64>,
    ) -> Result<Arc<GdbSession>, GdbError> {
        {
            let sessions = self.sessions.lock().await;
            if sessions.len() >= MAX_SESSIONS {
                return Err(GdbError::SessionLimit);
            }
        }

        let id = self.next_id();
        let path = gdb_path.unwrap_or_else(|| self.default_gdb_path.clone());
        let timeout = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        let session = Arc::new(GdbSession::new(id.clone(), path, working_dir, timeout));

        session.start().await?;

        {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(id.clone(), session.clone());
        }
        let _ = self.events.send(RegistryEvent::SessionAdded(id));
        Ok(session)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<GdbSession>> {
        self.sessions.lock().await.get(id).cloned()
    }

    /// Remove a session from the map and terminate it in the background,
    /// holding the only remaining strong reference for the duration of the
    /// terminate sequence so the force-kill timer cannot outlive its target.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(id);
        match removed {
            Some(session) => {
                let _ = self.events.send(RegistryEvent::SessionRemoved(id.to_string()));
                tokio::spawn(async move {
                    session.terminate().await;
                });
                true
            }
            None => false,
        }
    }

    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.lock().await;
        let mut out = Vec::with_capacity(sessions.len());
        for session in sessions.values() {
            out.push(SessionSummary {
                id: session.id().to_string(),
                target_program: session.target_program().await,
                state: session.state().await,
                working_dir: session.working_dir().map(ToString::to_string),
            });
        }
        out
    }

    /// Terminate every live session; used on server shutdown.
    pub async fn terminate_all(&self) {
        let sessions = {
            let mut guard = self.sessions.lock().await;
            guard.drain().collect::<Vec<_>>()
        };
        for (id, session) in sessions {
            let _ = self.events.send(RegistryEvent::SessionRemoved(id));
            session.terminate().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique_and_ordered_by_counter() {
        let registry = SessionRegistry::new("gdb");
        let a = registry.next_id();
        let b = registry.next_id();
        assert_ne!(a, b);
        assert!(a.ends_with("-0"));
        assert!(b.ends_with("-1"));
    }

    #[tokio::test]
    async fn get_on_empty_registry_is_none() {
        let registry = SessionRegistry::new("gdb");
        assert!(registry.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn remove_on_empty_registry_is_false() {
        let registry = SessionRegistry::new("gdb");
        assert!(!registry.remove("nope").await);
    }

    #[tokio::test]
    async fn list_on_empty_registry_is_empty() {
        let registry = SessionRegistry::new("gdb");
        assert!(registry.list().await.is_empty());
    }
}
