//! BARS scoring and scenario transition selection.
//!
//! The scorer is the heuristic floor of every turn: it runs in parallel
//! with the LLM path and its result is committed whenever the LLM output
//! is late or malformed. Everything here is pure CPU work — no await
//! points, safe to call under the session lock.

pub mod aggregate;
pub mod bars;
pub mod selector;
mod text;

pub use aggregate::{match_score, score_block, score_overall, PerformanceAnalysis};
pub use bars::score_answer;
pub use selector::next_node;
