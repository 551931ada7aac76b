//! The mutable state of one interview session.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use hf_domain::scoring::{QAnswer, ScoringUpdate};
use hf_scoring::aggregate;

/// One completed turn in the session history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub node_id: String,
    pub transcript: String,
    pub score: f64,
    pub block: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything a commit writes into the session, prepared outside the
/// lock by the orchestrator.
#[derive(Debug, Clone)]
pub struct TurnCommit {
    pub node_id: String,
    pub block: String,
    pub transcript: String,
    pub score: f64,
    pub weight: f64,
    pub next_node_id: Option<String>,
    pub red_flags: Vec<String>,
    /// The answer terminates the interview on a critical block.
    pub critical_fail: bool,
    /// The answer missed the drill threshold on a critical block; later
    /// turns prefer equivalence edges over drilling deeper.
    pub critical_weakness: bool,
}

/// Per-session mutable state. All access goes through the session
/// cell's async mutex; methods here are pure CPU work.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub session_id: String,
    pub candidate_id: String,
    pub scenario_id: String,
    pub role_profile_id: String,
    /// `None` once the interview has ended.
    pub current_node_id: Option<String>,
    pub history: Vec<HistoryEntry>,
    /// The scored answers the block scores derive from.
    pub answers: Vec<QAnswer>,
    pub block_scores: BTreeMap<String, f64>,
    pub overall_score: f64,
    pub red_flags: Vec<String>,
    pub critical_fail: bool,
    /// A critical block scored below the drill threshold at some point.
    pub critical_fail_recorded: bool,
    pub turn_seq: u64,
    pub created_at: DateTime<Utc>,
    pub last_turn_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(
        session_id: String,
        candidate_id: String,
        scenario_id: String,
        role_profile_id: String,
        start_node_id: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            candidate_id,
            scenario_id,
            role_profile_id,
            current_node_id: Some(start_node_id),
            history: Vec::new(),
            answers: Vec::new(),
            block_scores: BTreeMap::new(),
            overall_score: 0.0,
            red_flags: Vec::new(),
            critical_fail: false,
            critical_fail_recorded: false,
            turn_seq: 0,
            created_at: now,
            last_turn_at: now,
        }
    }

    /// Terminal when the node chain ended or a critical block failed.
    pub fn is_terminal(&self) -> bool {
        self.current_node_id.is_none() || self.critical_fail
    }

    /// Apply a completed turn: append the answer, recompute block and
    /// overall scores, advance the node, and return the scoring update.
    ///
    /// Runs under the session lock — no suspension points in here.
    pub fn commit_turn(
        &mut self,
        commit: TurnCommit,
        block_weights: &BTreeMap<String, f64>,
    ) -> ScoringUpdate {
        let previous_block_score = self
            .block_scores
            .get(&commit.block)
            .copied()
            .unwrap_or(0.0);

        self.answers.push(QAnswer {
            question_id: commit.node_id.clone(),
            block: commit.block.clone(),
            score: commit.score,
            weight: commit.weight,
        });

        self.block_scores = aggregate::all_block_scores(&self.answers);
        self.overall_score = aggregate::score_overall(&self.block_scores, block_weights);

        self.history.push(HistoryEntry {
            node_id: commit.node_id,
            transcript: commit.transcript,
            score: commit.score,
            block: commit.block.clone(),
            timestamp: Utc::now(),
        });

        self.red_flags.extend(commit.red_flags);
        self.current_node_id = commit.next_node_id;
        if commit.critical_fail {
            self.critical_fail = true;
        }
        if commit.critical_weakness {
            self.critical_fail_recorded = true;
        }
        self.last_turn_at = Utc::now();

        let new_block_score = self
            .block_scores
            .get(&commit.block)
            .copied()
            .unwrap_or(0.0);

        ScoringUpdate {
            block: commit.block,
            delta: new_block_score - previous_block_score,
            score: commit.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SessionState {
        SessionState::new(
            "s1".into(),
            "cand1".into(),
            "python_backend".into(),
            "python_backend".into(),
            "python_l1_intro".into(),
        )
    }

    fn commit(block: &str, score: f64, next: Option<&str>) -> TurnCommit {
        TurnCommit {
            node_id: format!("{block}_node"),
            block: block.into(),
            transcript: "answer".into(),
            score,
            weight: 1.0,
            next_node_id: next.map(Into::into),
            red_flags: vec![],
            critical_fail: false,
            critical_weakness: false,
        }
    }

    #[test]
    fn commit_advances_node_and_scores() {
        let mut s = state();
        let weights = BTreeMap::from([("python_backend".to_string(), 1.0)]);

        let update = s.commit_turn(commit("python_backend", 0.7, Some("l2")), &weights);
        assert_eq!(update.block, "python_backend");
        assert!((update.delta - 0.7).abs() < 1e-9);
        assert_eq!(s.current_node_id.as_deref(), Some("l2"));
        assert_eq!(s.history.len(), 1);
        assert!((s.overall_score - 0.7).abs() < 1e-9);
        assert!(!s.is_terminal());
    }

    #[test]
    fn null_next_node_is_terminal() {
        let mut s = state();
        let weights = BTreeMap::from([("python_backend".to_string(), 1.0)]);
        s.commit_turn(commit("python_backend", 0.9, None), &weights);
        assert!(s.is_terminal());
    }

    #[test]
    fn critical_fail_is_terminal_even_with_next_node() {
        let mut s = state();
        let weights = BTreeMap::from([("python_backend".to_string(), 1.0)]);
        let mut c = commit("python_backend", 0.1, Some("l2"));
        c.critical_fail = true;
        s.commit_turn(c, &weights);
        assert!(s.is_terminal());
        assert_eq!(s.current_node_id.as_deref(), Some("l2"));
    }

    #[test]
    fn delta_reflects_block_mean_change() {
        let mut s = state();
        let weights = BTreeMap::from([("python_backend".to_string(), 1.0)]);

        s.commit_turn(commit("python_backend", 1.0, Some("l2")), &weights);
        let update = s.commit_turn(commit("python_backend", 0.0, Some("l3")), &weights);
        // Block mean moved from 1.0 to 0.5.
        assert!((update.delta + 0.5).abs() < 1e-9);
        assert!((s.block_scores["python_backend"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn critical_weakness_sticks_without_terminating() {
        let mut s = state();
        let weights = BTreeMap::new();
        let mut c = commit("python_backend", 0.4, Some("l2"));
        c.critical_weakness = true;
        s.commit_turn(c, &weights);
        assert!(s.critical_fail_recorded);
        assert!(!s.is_terminal());
    }

    #[test]
    fn red_flags_accumulate() {
        let mut s = state();
        let weights = BTreeMap::new();
        let mut c = commit("python_backend", 0.0, Some("l2"));
        c.red_flags = vec!["empty_answer".into()];
        s.commit_turn(c, &weights);
        assert_eq!(s.red_flags, vec!["empty_answer"]);
    }
}
