//! Interview scenario data model.
//!
//! A scenario is a branching graph of question nodes keyed by id.
//! Transitions are stored as ids and resolved through the scenario store,
//! never as object handles, so the in-memory graph stays acyclic in
//! ownership terms.

use serde::{Deserialize, Serialize};

/// Scenario schema versions the store accepts on load.
pub const ACCEPTED_SCHEMA_VERSIONS: &[u32] = &[1];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scenario
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A complete interview scenario. Immutable once loaded; reloading
/// replaces the stored snapshot atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub schema_version: u32,
    #[serde(default)]
    pub policy: ScenarioPolicy,
    pub start_id: String,
    pub nodes: Vec<Node>,
}

impl Scenario {
    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }
}

/// Scenario-level scoring policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScenarioPolicy {
    /// Score at or above which the interviewer advances to a deeper
    /// question on the same topic. Used when the role profile omits its
    /// own drill threshold.
    #[serde(default = "d_drill_threshold")]
    pub drill_threshold: f64,
}

impl Default for ScenarioPolicy {
    fn default() -> Self {
        Self {
            drill_threshold: d_drill_threshold(),
        }
    }
}

fn d_drill_threshold() -> f64 {
    0.7
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Node
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One interview question with its criteria, weight, and outgoing
/// transitions. A `None` transition ends the interview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Competence block this question scores into (e.g. "python_backend").
    pub category: String,
    #[serde(default)]
    pub order: i32,
    pub question: String,
    #[serde(default = "d_weight")]
    pub weight: f64,
    /// Keywords / short phrases a strong answer covers.
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub followups: Vec<String>,
    #[serde(default)]
    pub next_if_pass: Option<String>,
    #[serde(default)]
    pub next_if_fail: Option<String>,
    /// Alternative edge taken when a weak area is compensated by a
    /// related strong one.
    #[serde(default)]
    pub next_if_equivalent: Option<String>,
}

fn d_weight() -> f64 {
    1.0
}

impl Node {
    /// All outgoing edges, in (pass, fail, equivalent) order.
    pub fn edges(&self) -> impl Iterator<Item = &str> {
        self.next_if_pass
            .iter()
            .chain(self.next_if_fail.iter())
            .chain(self.next_if_equivalent.iter())
            .map(String::as_str)
    }
}
