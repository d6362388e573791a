//! Connection-id to session map shared by all connections.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::session::ConversationSession;

/// Identifier assigned to each client connection on connect.
pub type ConnectionId = Uuid;

/// Live sessions, keyed by the connection that owns them.
///
/// A session is inserted when its connection opens and removed when the
/// connection closes or the session becomes unusable.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Arc<ConversationSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its own id, replacing any previous entry.
    pub fn insert(&self, session: Arc<ConversationSession>) -> Option<Arc<ConversationSession>> {
        let id = session.id();
        let previous = self.sessions.insert(id, session);
        debug!(connection_id = %id, active = self.sessions.len(), "Session registered");
        previous
    }

    pub fn get(&self, id: &ConnectionId) -> Option<Arc<ConversationSession>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<ConversationSession>> {
        let removed = self.sessions.remove(id).map(|(_, session)| session);
        if removed.is_some() {
            debug!(connection_id = %id, active = self.sessions.len(), "Session removed");
        }
        removed
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }
}
