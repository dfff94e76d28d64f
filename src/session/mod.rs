//! In-memory conversation sessions.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AgentError, Result};
use crate::types::Content;

/// Primary key of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// One conversation and its ordered history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub history: Vec<Content>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.key.app_name
    }

    pub fn user_id(&self) -> &str {
        &self.key.user_id
    }

    pub fn session_id(&self) -> &str {
        &self.key.session_id
    }
}

/// Process-wide session registry.
///
/// Sessions are never created implicitly, and a key can be created only once.
/// Readers receive snapshots; the runner is the only writer during a turn.
/// Concurrent turns against the same session are not coordinated.
#[derive(Debug, Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new empty session; an existing key is a `DuplicateSession` error.
    pub fn create_session(&self, app_name: &str, user_id: &str, session_id: &str) -> Result<Session> {
        let key = SessionKey::new(app_name, user_id, session_id);
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&key) {
            return Err(AgentError::DuplicateSession(key.to_string()));
        }
        let session = Session::new(key.clone());
        sessions.insert(key, session.clone());
        debug!(session = %session.key, "session created");
        Ok(session)
    }

    /// Snapshot of a session, or `None` if the key is unknown.
    pub fn get_session(&self, app_name: &str, user_id: &str, session_id: &str) -> Option<Session> {
        let key = SessionKey::new(app_name, user_id, session_id);
        self.get(&key)
    }

    pub fn get(&self, key: &SessionKey) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Keys of every session belonging to one user of one app, sorted.
    pub fn list_sessions(&self, app_name: &str, user_id: &str) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|k| k.app_name == app_name && k.user_id == user_id)
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Remove a session; returns whether it existed.
    pub fn delete_session(&self, app_name: &str, user_id: &str, session_id: &str) -> bool {
        let key = SessionKey::new(app_name, user_id, session_id);
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
            .is_some()
    }

    /// Append one content item to a session's history.
    pub fn append_content(&self, key: &SessionKey, content: Content) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .get_mut(key)
            .ok_or_else(|| AgentError::SessionNotFound(key.to_string()))?;
        session.history.push(content);
        session.updated_at = Utc::now();
        Ok(())
    }
}
