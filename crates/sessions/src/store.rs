//! In-memory session store.
//!
//! Each session is an [`SessionCell`]: state behind an async mutex, a
//! turn slot serializing turns, the cancel token of the in-flight turn,
//! the backchannel rate-limit clock, and a broadcast event bus. The
//! store maps session ids to cells and enforces one active session per
//! (candidate, role) pair.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use hf_domain::error::{Error, Result};
use hf_domain::turn::SessionEvent;

use crate::cancel::CancelToken;
use crate::state::SessionState;

const EVENT_BUS_CAPACITY: usize = 64;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SessionCell
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One live session and the concurrency state it exclusively owns.
pub struct SessionCell {
    pub session_id: String,
    candidate_key: (String, String),
    state: tokio::sync::Mutex<SessionState>,
    turn_slot: Arc<Semaphore>,
    cancel: Mutex<Option<CancelToken>>,
    events: broadcast::Sender<SessionEvent>,
    backchannel_counter: AtomicU64,
    last_backchannel: Mutex<Option<Instant>>,
}

/// The acquired right to run one turn: the fresh cancel token plus the
/// permit that serializes turns. Dropping the slot frees the session
/// for the next turn.
pub struct TurnSlot {
    pub token: CancelToken,
    _permit: OwnedSemaphorePermit,
}

impl SessionCell {
    fn new(state: SessionState) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            session_id: state.session_id.clone(),
            candidate_key: (state.candidate_id.clone(), state.role_profile_id.clone()),
            state: tokio::sync::Mutex::new(state),
            turn_slot: Arc::new(Semaphore::new(1)),
            cancel: Mutex::new(None),
            events,
            backchannel_counter: AtomicU64::new(0),
            last_backchannel: Mutex::new(None),
        }
    }

    /// Lock the session state. Callers must not await other I/O while
    /// holding the guard.
    pub async fn lock_state(&self) -> tokio::sync::MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Start a turn: cancel any in-flight turn (newest-wins), register a
    /// fresh token, then wait for the turn slot.
    ///
    /// The returned token may already be cancelled if an even newer turn
    /// arrived while this one waited — the pipeline checks it first
    /// thing after acquisition.
    pub async fn begin_turn(&self) -> TurnSlot {
        let token = CancelToken::new();
        {
            let mut slot = self.cancel.lock();
            if let Some(previous) = slot.replace(token.clone()) {
                previous.cancel();
            }
        }

        let permit = self
            .turn_slot
            .clone()
            .acquire_owned()
            .await
            .expect("turn slot semaphore never closed");

        TurnSlot {
            token,
            _permit: permit,
        }
    }

    /// Cancel the in-flight turn, if any.
    pub fn cancel_current_turn(&self) {
        if let Some(token) = self.cancel.lock().as_ref() {
            token.cancel();
        }
    }

    /// Subscribe to this session's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Publish an event; lagging or absent receivers are fine.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Whether enough time has passed since the last backchannel emit.
    pub fn backchannel_allowed(&self, min_interval: Duration) -> bool {
        match *self.last_backchannel.lock() {
            Some(last) => last.elapsed() >= min_interval,
            None => true,
        }
    }

    /// Record a backchannel emit and return the round-robin counter for
    /// the emitted utterance.
    pub fn record_backchannel_emit(&self) -> u64 {
        *self.last_backchannel.lock() = Some(Instant::now());
        self.backchannel_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// The current backchannel counter (deterministic round-robin seed).
    pub fn backchannel_counter(&self) -> u64 {
        self.backchannel_counter.load(Ordering::Relaxed)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SessionStore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Keyed map of live sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionCell>>>,
    /// (candidate_id, role_profile_id) → session_id, for duplicate-start
    /// detection.
    by_candidate: RwLock<HashMap<(String, String), String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session. A second start for the same candidate and role
    /// while one is active is a conflict.
    pub fn begin(
        &self,
        candidate_id: &str,
        role_profile_id: &str,
        scenario_id: &str,
        start_node_id: &str,
    ) -> Result<Arc<SessionCell>> {
        let key = (candidate_id.to_owned(), role_profile_id.to_owned());

        let mut by_candidate = self.by_candidate.write();
        if let Some(existing) = by_candidate.get(&key) {
            return Err(Error::Conflict(format!(
                "candidate \"{candidate_id}\" already has active session {existing} for role \"{role_profile_id}\""
            )));
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let state = SessionState::new(
            session_id.clone(),
            candidate_id.to_owned(),
            scenario_id.to_owned(),
            role_profile_id.to_owned(),
            start_node_id.to_owned(),
        );
        let cell = Arc::new(SessionCell::new(state));

        by_candidate.insert(key, session_id.clone());
        self.sessions.write().insert(session_id.clone(), cell.clone());

        tracing::info!(
            session_id = %session_id,
            candidate_id,
            role_profile_id,
            scenario_id,
            "session started"
        );

        Ok(cell)
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<SessionCell>> {
        self.sessions.read().get(session_id).cloned()
    }

    /// End a session: cancel any in-flight turn and drop it from the map.
    pub fn end(&self, session_id: &str) -> Result<()> {
        let cell = self
            .sessions
            .write()
            .remove(session_id)
            .ok_or_else(|| Error::NotFound(format!("session \"{session_id}\"")))?;

        cell.cancel_current_turn();
        self.by_candidate.write().remove(&cell.candidate_key);
        tracing::info!(session_id, "session ended");
        Ok(())
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Evict sessions idle past the timeout. Returns the evicted ids.
    pub async fn sweep_idle(&self, idle_timeout_s: u64) -> Vec<String> {
        let now = chrono::Utc::now();
        let cells: Vec<Arc<SessionCell>> = self.sessions.read().values().cloned().collect();

        let mut evicted = Vec::new();
        for cell in cells {
            let last_turn_at = cell.lock_state().await.last_turn_at;
            if crate::lifecycle::idle_expired(last_turn_at, now, idle_timeout_s) {
                evicted.push(cell.session_id.clone());
            }
        }

        for session_id in &evicted {
            if self.end(session_id).is_ok() {
                tracing::info!(session_id, "idle session evicted");
            }
        }
        evicted
    }
}
