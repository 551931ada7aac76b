//! Per-turn records and the events published on a session's bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::ScoringUpdate;

/// Where the substantive reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Llm,
    Heuristic,
}

/// Per-stage latency breakdown for one turn, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StageTimings {
    /// Upstream speech-to-text time, when the ASR side reports it.
    pub asr_ms: u64,
    /// Dialogue management: scoring + selection + commit.
    pub dm_ms: u64,
    pub llm_ms: u64,
    /// Downstream synthesis time, when the TTS side reports it.
    pub tts_ms: u64,
    pub total_ms: u64,
}

/// Append-only record of one completed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn_seq: u64,
    pub session_id: String,
    pub node_id: String,
    pub transcript: String,
    pub backchannel_text: Option<String>,
    pub reply_text: String,
    pub next_node_id: Option<String>,
    pub scoring_update: ScoringUpdate,
    pub red_flags: Vec<String>,
    pub source: ReplySource,
    pub timings: StageTimings,
    pub completed_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session events
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Events published on a session's event bus during a turn.
///
/// For any turn N, `Backchannel` (if emitted) precedes `TurnComplete`,
/// and `TurnComplete` of turn N precedes any event of turn N+1.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Short filler utterance, emitted early while the substantive reply
    /// is still being prepared.
    #[serde(rename = "backchannel")]
    Backchannel { turn_seq: u64, text: String },

    /// The completed turn.
    #[serde(rename = "turn_complete")]
    TurnComplete(TurnCompleted),
}

/// Payload of a `turn_complete` event (also the synchronous `/turn`
/// response body).
#[derive(Debug, Clone, Serialize)]
pub struct TurnCompleted {
    pub turn_seq: u64,
    pub reply: String,
    pub next_node_id: Option<String>,
    pub scoring_update: ScoringUpdate,
    pub red_flags: Vec<String>,
    pub source: ReplySource,
    pub timings: StageTimings,
}
