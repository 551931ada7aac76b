use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Backchannel tables
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackchannelConfig {
    /// Minimum gap between two backchannel emits on the same session.
    #[serde(default = "d_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Per-role utterance tables. Roles without an entry use the default
    /// table.
    #[serde(default)]
    pub roles: HashMap<String, BackchannelTable>,
    #[serde(default)]
    pub default_table: BackchannelTable,
}

impl Default for BackchannelConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: d_min_interval_ms(),
            roles: HashMap::new(),
            default_table: BackchannelTable::default(),
        }
    }
}

impl BackchannelConfig {
    /// The utterance table for a role, falling back to the default table.
    pub fn table(&self, role: &str) -> &BackchannelTable {
        self.roles.get(role).unwrap_or(&self.default_table)
    }
}

/// Filler utterances partitioned by tone, with the score thresholds that
/// select among them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackchannelTable {
    #[serde(default = "d_positive")]
    pub generic_positive: Vec<String>,
    #[serde(default = "d_neutral")]
    pub generic_neutral: Vec<String>,
    #[serde(default = "d_negative")]
    pub generic_negative: Vec<String>,
    /// Running score at or above which positive fillers are used.
    #[serde(default = "d_positive_threshold")]
    pub positive_threshold: f64,
    /// Running score below which negative fillers are used.
    #[serde(default = "d_negative_threshold")]
    pub negative_threshold: f64,
}

impl Default for BackchannelTable {
    fn default() -> Self {
        Self {
            generic_positive: d_positive(),
            generic_neutral: d_neutral(),
            generic_negative: d_negative(),
            positive_threshold: d_positive_threshold(),
            negative_threshold: d_negative_threshold(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_min_interval_ms() -> u64 {
    2000
}
fn d_positive() -> Vec<String> {
    vec![
        "Great, go on".into(),
        "That sounds solid".into(),
        "Nice, tell me more".into(),
    ]
}
fn d_neutral() -> Vec<String> {
    vec![
        "I see".into(),
        "Go on".into(),
        "Mm-hm".into(),
        "Understood".into(),
    ]
}
fn d_negative() -> Vec<String> {
    vec!["Okay".into(), "Alright, let's continue".into()]
}
fn d_positive_threshold() -> f64 {
    0.7
}
fn d_negative_threshold() -> f64 {
    0.3
}
