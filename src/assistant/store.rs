//! In-process session table.
//!
//! Each session id maps to its own async mutex, so a turn holds only its own
//! session while it waits on the language model. With [`LockScope::Global`]
//! every turn additionally takes one shared gate, serializing all sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::{ConversationState, Language};

/// How widely a dialogue turn is serialized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    #[default]
    PerSession,
    Global,
}

impl LockScope {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "per_session" => Some(Self::PerSession),
            "global" => Some(Self::Global),
            _ => None,
        }
    }
}

type Slot = Arc<AsyncMutex<ConversationState>>;

/// Exclusive access to one session for the duration of a turn.
pub struct SessionGuard {
    // Field order matters: the session is released before the global gate.
    pub state: OwnedMutexGuard<ConversationState>,
    _gate: Option<OwnedMutexGuard<()>>,
    /// Whether the session was created by this checkout.
    pub created: bool,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Slot>>>,
    gate: Option<Arc<AsyncMutex<()>>>,
}

impl SessionStore {
    pub fn new(scope: LockScope) -> Self {
        let gate = match scope {
            LockScope::PerSession => None,
            LockScope::Global => Some(Arc::new(AsyncMutex::new(()))),
        };
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            gate,
        }
    }

    pub fn scope(&self) -> LockScope {
        match self.gate {
            Some(_) => LockScope::Global,
            None => LockScope::PerSession,
        }
    }

    /// Lock the session, creating it at the first step when it does not exist.
    pub async fn checkout(&self, session_id: &str, language: Language) -> SessionGuard {
        let gate = match &self.gate {
            Some(gate) => Some(gate.clone().lock_owned().await),
            None => None,
        };

        let (slot, created) = {
            let mut sessions = self.sessions.lock().expect("session table lock poisoned");
            match sessions.get(session_id) {
                Some(slot) => (slot.clone(), false),
                None => {
                    let slot = Arc::new(AsyncMutex::new(ConversationState::new(language)));
                    sessions.insert(session_id.to_string(), slot.clone());
                    (slot, true)
                }
            }
        };

        SessionGuard {
            state: slot.lock_owned().await,
            _gate: gate,
            created,
        }
    }

    /// Snapshot of a session. Waits for an in-flight turn on that session.
    pub async fn get(&self, session_id: &str) -> Option<ConversationState> {
        let slot = {
            let sessions = self.sessions.lock().expect("session table lock poisoned");
            sessions.get(session_id).cloned()
        }?;
        let state = slot.lock().await;
        Some(state.clone())
    }

    pub fn remove(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock().expect("session table lock poisoned");
        sessions.remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().expect("session table lock poisoned");
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(LockScope::default())
    }
}
