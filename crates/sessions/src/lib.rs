//! Per-candidate interview session state.
//!
//! Sessions live in an in-memory map. Each session exclusively owns its
//! mutable state behind an async mutex, a turn slot that serializes
//! turns (newest-wins), a cancellation token for the in-flight turn, and
//! a broadcast event bus. Scenario and role-profile snapshots are read
//! through their stores by id; sessions never hold object graphs.

mod cancel;
mod lifecycle;
mod state;
mod store;

pub use cancel::CancelToken;
pub use lifecycle::idle_expired;
pub use state::{HistoryEntry, SessionState, TurnCommit};
pub use store::{SessionCell, SessionStore, TurnSlot};
