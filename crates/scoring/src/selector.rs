//! Scenario transition selection.
//!
//! The selector is the only component that produces node transitions;
//! the orchestrator never invents one. `None` means the interview ends.

use hf_domain::profile::RoleProfile;
use hf_domain::scenario::{Node, ScenarioPolicy};

/// Pick the next node id for a scored answer.
///
/// Rules, in order:
/// 1. an equivalence edge qualifies when it exists, the block is not
///    critical for the role, and `score >= thresholds.equivalent`;
/// 2. the pass edge qualifies when `score >= drill threshold` (the role
///    profile's, falling back to the scenario policy);
/// 3. otherwise the fail edge is taken.
///
/// When both pass and equivalence qualify, pass wins unless a
/// critical-block fail was recorded earlier in the session.
pub fn next_node<'a>(
    node: &'a Node,
    score: f64,
    profile: &RoleProfile,
    policy: &ScenarioPolicy,
    critical_fail_recorded: bool,
) -> Option<&'a str> {
    let drill = profile.thresholds.drill.unwrap_or(policy.drill_threshold);

    let equivalent_qualifies = node.next_if_equivalent.is_some()
        && !profile.is_critical(&node.category)
        && score >= profile.thresholds.equivalent;
    let pass_qualifies = score >= drill;

    let edge = if equivalent_qualifies && pass_qualifies {
        if critical_fail_recorded {
            &node.next_if_equivalent
        } else {
            &node.next_if_pass
        }
    } else if equivalent_qualifies {
        &node.next_if_equivalent
    } else if pass_qualifies {
        &node.next_if_pass
    } else {
        &node.next_if_fail
    };

    edge.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_domain::profile::Thresholds;
    use std::collections::{BTreeMap, BTreeSet};

    fn node(pass: Option<&str>, fail: Option<&str>, equivalent: Option<&str>) -> Node {
        Node {
            id: "hw_l2_raid_bmc".into(),
            category: "hardware".into(),
            order: 2,
            question: "RAID and BMC experience?".into(),
            weight: 1.0,
            success_criteria: vec!["raid".into()],
            followups: vec![],
            next_if_pass: pass.map(Into::into),
            next_if_fail: fail.map(Into::into),
            next_if_equivalent: equivalent.map(Into::into),
        }
    }

    fn profile(critical: &[&str]) -> RoleProfile {
        RoleProfile {
            id: "it_dc_ops".into(),
            block_weights: BTreeMap::from([("hardware".into(), 1.0)]),
            thresholds: Thresholds {
                pass: 0.7,
                drill: Some(0.7),
                equivalent: 0.6,
                critical_fail: 0.3,
            },
            scenario_id: None,
            critical_blocks: critical.iter().map(|s| s.to_string()).collect(),
        }
    }

    const POLICY: ScenarioPolicy = ScenarioPolicy {
        drill_threshold: 0.7,
    };

    #[test]
    fn high_score_follows_pass_edge() {
        let n = node(Some("deeper"), Some("remedial"), None);
        assert_eq!(next_node(&n, 0.9, &profile(&[]), &POLICY, false), Some("deeper"));
    }

    #[test]
    fn low_score_follows_fail_edge() {
        let n = node(Some("deeper"), Some("remedial"), None);
        assert_eq!(
            next_node(&n, 0.3, &profile(&[]), &POLICY, false),
            Some("remedial")
        );
    }

    #[test]
    fn equivalence_taken_between_thresholds() {
        // 0.6 <= score < 0.7: equivalence qualifies, pass does not.
        let n = node(Some("deeper"), Some("remedial"), Some("sys_l1_os_imaging"));
        assert_eq!(
            next_node(&n, 0.65, &profile(&[]), &POLICY, false),
            Some("sys_l1_os_imaging")
        );
    }

    #[test]
    fn tiebreak_prefers_pass() {
        let n = node(Some("deeper"), Some("remedial"), Some("alt"));
        assert_eq!(next_node(&n, 0.8, &profile(&[]), &POLICY, false), Some("deeper"));
    }

    #[test]
    fn tiebreak_prefers_equivalent_after_critical_fail() {
        let n = node(Some("deeper"), Some("remedial"), Some("alt"));
        assert_eq!(next_node(&n, 0.8, &profile(&[]), &POLICY, true), Some("alt"));
    }

    #[test]
    fn critical_block_never_takes_equivalence() {
        let n = node(Some("deeper"), Some("remedial"), Some("alt"));
        assert_eq!(
            next_node(&n, 0.65, &profile(&["hardware"]), &POLICY, false),
            Some("remedial")
        );
    }

    #[test]
    fn null_edge_ends_interview() {
        let n = node(None, Some("remedial"), None);
        assert_eq!(next_node(&n, 0.9, &profile(&[]), &POLICY, false), None);
    }

    #[test]
    fn profile_drill_overrides_policy() {
        let mut p = profile(&[]);
        p.thresholds.drill = Some(0.5);
        let n = node(Some("deeper"), Some("remedial"), None);
        assert_eq!(next_node(&n, 0.55, &p, &POLICY, false), Some("deeper"));
    }

    #[test]
    fn policy_drill_used_when_profile_omits_it() {
        let mut p = profile(&[]);
        p.thresholds.drill = None;
        let relaxed = ScenarioPolicy {
            drill_threshold: 0.5,
        };
        let n = node(Some("deeper"), Some("remedial"), None);
        assert_eq!(next_node(&n, 0.55, &p, &relaxed, false), Some("deeper"));
    }
}
