//! Role profiles: per-role block weighting and scoring thresholds.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Tolerance for the block-weight sum after normalization.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// A hiring role with its block weights and threshold policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleProfile {
    pub id: String,
    /// Block name → weight. Normalized to sum to 1.0 on load.
    pub block_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Scenario this role interviews with, when pinned.
    #[serde(default)]
    pub scenario_id: Option<String>,
    /// Blocks whose failure cannot be compensated by an equivalence edge.
    #[serde(default)]
    pub critical_blocks: BTreeSet<String>,
}

impl RoleProfile {
    /// Normalize block weights in place so they sum to 1.0.
    ///
    /// A profile with no weights (or an all-zero table) is left untouched.
    pub fn normalize_weights(&mut self) {
        let sum: f64 = self.block_weights.values().sum();
        if sum > 0.0 {
            for w in self.block_weights.values_mut() {
                *w /= sum;
            }
        }
    }

    /// Whether the block weights sum to 1.0 within tolerance.
    pub fn weights_normalized(&self) -> bool {
        let sum: f64 = self.block_weights.values().sum();
        (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    pub fn is_critical(&self, block: &str) -> bool {
        self.critical_blocks.contains(block)
    }

    /// The built-in profile used when a role id is unknown: a single
    /// "general" block with permissive thresholds.
    pub fn fallback() -> Self {
        Self {
            id: "default".into(),
            block_weights: BTreeMap::from([("general".into(), 1.0)]),
            thresholds: Thresholds::default(),
            scenario_id: None,
            critical_blocks: BTreeSet::new(),
        }
    }
}

/// Score thresholds governing transitions and termination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum overall score to pass the interview.
    #[serde(default = "d_pass")]
    pub pass: f64,
    /// Score at or above which the pass edge is taken (deeper question).
    /// When absent, the scenario policy's drill threshold applies.
    #[serde(default)]
    pub drill: Option<f64>,
    /// Score at or above which an equivalence edge qualifies.
    #[serde(default = "d_equivalent")]
    pub equivalent: f64,
    /// Score below which a critical-block answer terminates the interview.
    #[serde(default = "d_critical_fail")]
    pub critical_fail: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pass: d_pass(),
            drill: None,
            equivalent: d_equivalent(),
            critical_fail: d_critical_fail(),
        }
    }
}

fn d_pass() -> f64 {
    0.7
}
fn d_equivalent() -> f64 {
    0.6
}
fn d_critical_fail() -> f64 {
    0.3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_weights_sums_to_one() {
        let mut profile = RoleProfile {
            id: "it_dc_ops".into(),
            block_weights: BTreeMap::from([
                ("hardware".into(), 2.0),
                ("sysadmin".into(), 1.0),
                ("network".into(), 1.0),
            ]),
            thresholds: Thresholds::default(),
            scenario_id: None,
            critical_blocks: BTreeSet::new(),
        };
        profile.normalize_weights();
        assert!(profile.weights_normalized());
        assert!((profile.block_weights["hardware"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn normalize_empty_weights_is_noop() {
        let mut profile = RoleProfile::fallback();
        profile.block_weights.clear();
        profile.normalize_weights();
        assert!(profile.block_weights.is_empty());
    }

    #[test]
    fn threshold_defaults() {
        let t = Thresholds::default();
        assert_eq!(t.pass, 0.7);
        assert_eq!(t.drill, None);
        assert_eq!(t.equivalent, 0.6);
        assert_eq!(t.critical_fail, 0.3);
    }
}
