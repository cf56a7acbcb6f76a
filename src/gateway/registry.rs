//! Shared table of live connections, used for presence.
//!
//! Presence is per-**user**, not per-connection: a user is reported offline
//! only when their last live connection goes away. Connection teardowns run
//! on separate tasks, so that decision must be atomic — `remove` decrements
//! a per-user counter under its entry lock and reports whether this was the
//! user's last connection; two concurrent teardowns can never both see zero.
//! The registry is owned by `AppState`, never a process-wide global, so
//! several gateways can coexist in one process.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Identity attached to one live connection.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub user_id: String,
    pub empresa_id: String,
}

pub struct SessionRegistry {
    sessions: DashMap<String, SessionInfo>,
    user_counts: DashMap<String, usize>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            user_counts: DashMap::new(),
        }
    }

    /// Register an admitted connection.
    pub fn insert(&self, connection_id: String, user_id: String, empresa_id: String) {
        *self.user_counts.entry(user_id.clone()).or_insert(0) += 1;
        self.sessions.insert(
            connection_id,
            SessionInfo {
                user_id,
                empresa_id,
            },
        );
    }

    /// Remove a connection. Safe to call for ids that were never registered
    /// (a peer can vanish mid-admission). Returns the removed info and
    /// whether this was the user's last live connection, decided atomically
    /// under the per-user counter's lock.
    pub fn remove(&self, connection_id: &str) -> Option<(SessionInfo, bool)> {
        let (_, info) = self.sessions.remove(connection_id)?;
        let last_for_user = match self.user_counts.entry(info.user_id.clone()) {
            Entry::Occupied(mut occupied) => {
                let count = occupied.get_mut();
                *count = count.saturating_sub(1);
                if *count == 0 {
                    occupied.remove();
                    true
                } else {
                    false
                }
            }
            // Insert and remove are paired per connection, so a missing
            // counter means this connection was never fully admitted.
            Entry::Vacant(_) => false,
        };
        Some((info, last_for_user))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
