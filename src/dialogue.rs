//! Guided data-entry dialogue — a four-step finite-state machine.
//!
//! One [`DialogueSession`] per conversation walks through the fields of a
//! [`Record`] in a fixed order. Any text is accepted verbatim for any
//! field; only skip and cancel have special meaning. The record is
//! persisted exactly once, when the last field lands.
//!
//! Skip is state-relative: the field written with the sentinel is the
//! first one still missing from the session, so all four states share one
//! skip path instead of four near-duplicate handlers.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::error::AppError;
use crate::store::{MISSING, Record, RecordStore};

/// Collection order of the record fields.
const FIELDS: [&str; 4] = ["name", "address", "password", "note"];

/// Dialogue position. Non-terminal states name the next field to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Name,
    Address,
    Password,
    Note,
    /// Record persisted. Terminal.
    Done,
    /// Aborted, nothing persisted. Terminal.
    Cancelled,
}

impl DialogueState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DialogueState::Done | DialogueState::Cancelled)
    }

    /// State that collects `FIELDS[i]`; past the end means [`Done`](Self::Done).
    fn collecting(i: usize) -> Self {
        match i {
            0 => DialogueState::Name,
            1 => DialogueState::Address,
            2 => DialogueState::Password,
            3 => DialogueState::Note,
            _ => DialogueState::Done,
        }
    }
}

/// Per-conversation dialogue state. Owned exclusively by its conversation,
/// never shared, dropped on completion or cancellation.
#[derive(Debug)]
pub struct DialogueSession {
    state: DialogueState,
    collected: HashMap<&'static str, String>,
}

impl DialogueSession {
    pub fn new() -> Self {
        Self { state: DialogueState::Name, collected: HashMap::new() }
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    /// First field not yet collected. After a failed persist the whole
    /// set may be present; the retry then re-targets the final field.
    fn current_field(&self) -> &'static str {
        FIELDS
            .iter()
            .find(|f| !self.collected.contains_key(*f))
            .copied()
            .unwrap_or(FIELDS[FIELDS.len() - 1])
    }

    fn to_record(&self) -> Record {
        let get = |f: &str| self.collected.get(f).cloned().unwrap_or_else(|| MISSING.to_string());
        Record {
            name: get("name"),
            address: get("address"),
            password: get("password"),
            note: get("note"),
        }
    }
}

impl Default for DialogueSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives [`DialogueSession`]s and persists completed ones.
pub struct DialogueEngine {
    store: RecordStore,
}

impl DialogueEngine {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Reset the session to the first field.
    pub fn begin(&self, session: &mut DialogueSession) -> DialogueState {
        *session = DialogueSession::new();
        session.state
    }

    /// Accept free text for the current field. Leading/trailing whitespace
    /// is trimmed; an empty result counts as a skip.
    pub fn handle_input(
        &self,
        session: &mut DialogueSession,
        text: &str,
    ) -> Result<DialogueState, AppError> {
        let value = text.trim();
        let value = if value.is_empty() { MISSING } else { value };
        self.advance(session, value)
    }

    /// Store the sentinel for the current field and move on.
    pub fn handle_skip(&self, session: &mut DialogueSession) -> Result<DialogueState, AppError> {
        self.advance(session, MISSING)
    }

    /// Abort the dialogue. Terminal; guarantees no partial write.
    pub fn cancel(&self, session: &mut DialogueSession) -> DialogueState {
        debug!("dialogue cancelled");
        session.state = DialogueState::Cancelled;
        session.state
    }

    fn advance(
        &self,
        session: &mut DialogueSession,
        value: &str,
    ) -> Result<DialogueState, AppError> {
        if session.state.is_terminal() {
            return Ok(session.state);
        }

        let field = session.current_field();
        session.collected.insert(field, value.to_string());
        let field_index = FIELDS.iter().position(|f| *f == field).unwrap_or(FIELDS.len() - 1);

        if field_index == FIELDS.len() - 1 {
            // Final field: persist before declaring the session done. On
            // failure the state stays at Note so the caller can retry or
            // cancel; nothing is considered saved.
            self.store.append(&session.to_record())?;
            info!("dialogue record saved");
            session.state = DialogueState::Done;
        } else {
            session.state = DialogueState::collecting(field_index + 1);
        }
        Ok(session.state)
    }
}

// ── session map ───────────────────────────────────────────────────────────────

/// Active sessions keyed by chat id.
///
/// Entries are removed as soon as a session reaches a terminal state, so
/// an abandoned `/fill` is the only way a session lingers (until the next
/// `/fill` or `/cancel` from that chat replaces or removes it).
pub struct SessionMap {
    inner: Mutex<HashMap<i64, DialogueSession>>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self { inner: Mutex::new(HashMap::new()) }
    }

    /// Insert a fresh session for `chat`, replacing any stale one.
    pub fn insert_new(&self, chat: i64) {
        self.lock().insert(chat, DialogueSession::new());
    }

    pub fn is_active(&self, chat: i64) -> bool {
        self.lock().contains_key(&chat)
    }

    /// Run `f` against the chat's session, then tear the entry down if the
    /// session ended up terminal. `None` when the chat has no session.
    pub fn with<R>(&self, chat: i64, f: impl FnOnce(&mut DialogueSession) -> R) -> Option<R> {
        let mut map = self.lock();
        let session = map.get_mut(&chat)?;
        let result = f(session);
        if session.state().is_terminal() {
            map.remove(&chat);
        }
        Some(result)
    }

    /// Drop the chat's session without completing it. Returns whether a
    /// session existed.
    pub fn remove(&self, chat: i64) -> bool {
        self.lock().remove(&chat).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, DialogueSession>> {
        // A poisoned map only means a panic mid-handler; the sessions
        // themselves are still structurally sound.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionMap {
    fn default() -> Self {
        Self::new()
    }
}
