use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message exchanged in a conversation. Appended, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A saved conversation, keyed by the remote thread that backs it.
#[derive(Debug, Clone)]
pub struct Session {
    pub thread_id: String,
    pub turns: Vec<Turn>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Session {
    /// Sidebar label: the first user turn, truncated. Preset questions can be
    /// non-ASCII, so truncation counts characters rather than bytes.
    pub fn preview(&self, max_len: usize) -> String {
        for turn in &self.turns {
            if turn.role != Role::User {
                continue;
            }
            let text = turn.content.trim();
            if text.is_empty() {
                continue;
            }

            return if text.chars().count() > max_len {
                let truncated: String = text.chars().take(max_len).collect();
                format!("{}...", truncated)
            } else {
                text.to_string()
            };
        }
        "New chat".to_string()
    }
}

/// In-memory list of saved sessions, insertion order preserved.
/// At most one entry per thread id.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
}

impl SessionStore {
    /// Replace the turns of an existing session or append a new one.
    pub fn upsert(&mut self, thread_id: &str, turns: &[Turn]) {
        let now = unix_now();

        if let Some(existing) = self
            .sessions
            .iter_mut()
            .find(|s| s.thread_id == thread_id)
        {
            existing.turns = turns.to_vec();
            existing.updated_at = now;
        } else {
            self.sessions.push(Session {
                thread_id: thread_id.to_string(),
                turns: turns.to_vec(),
                created_at: now,
                updated_at: now,
            });
        }
    }

    /// Remove a session. Tolerates ids that are no longer present (a stale
    /// sidebar reference is not an error). Returns whether anything was removed.
    pub fn remove(&mut self, thread_id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.thread_id != thread_id);
        self.sessions.len() != before
    }

    pub fn get(&self, thread_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.thread_id == thread_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions newest-insertion-first, the order the sidebar shows them in.
    pub fn iter_recent(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter().rev()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Chat,
}

/// The whole per-run state: active view, active conversation and the store
/// of saved sessions. Owned by the session manager, no ambient globals.
#[derive(Debug)]
pub struct AppState {
    pub view: View,
    pub active_turns: Vec<Turn>,
    /// `None` until the first question of a conversation binds a remote thread.
    pub active_thread_id: Option<String>,
    /// A question submitted from the home view, waiting for the chat view to
    /// pick it up.
    pub pending_question: Option<String>,
    pub store: SessionStore,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            view: View::Home,
            active_turns: Vec::new(),
            active_thread_id: None,
            pending_question: None,
            store: SessionStore::default(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time is before UNIX epoch")
        .as_secs()
}
