//! Turn execution runtime: the orchestrator, backchannel selection, and
//! metrics recording.

pub mod backchannel;
pub mod metrics;
pub mod turn;

pub use turn::{run_turn, TurnEvent, TurnInput};
