//! Load-time scenario validation.
//!
//! A scenario that passes here satisfies the store's invariants: every
//! referenced transition resolves, no node transitions to itself, and at
//! least one path from the start node reaches a terminal.

use std::collections::{HashSet, VecDeque};

use hf_domain::scenario::{Scenario, ACCEPTED_SCHEMA_VERSIONS};

/// Validate a scenario, returning every problem found (empty = valid).
pub fn validate(scenario: &Scenario) -> Vec<String> {
    let mut reasons = Vec::new();

    if scenario.id.trim().is_empty() {
        reasons.push("scenario id must not be empty".into());
    }

    if !ACCEPTED_SCHEMA_VERSIONS.contains(&scenario.schema_version) {
        reasons.push(format!(
            "unsupported schema_version {} (accepted: {ACCEPTED_SCHEMA_VERSIONS:?})",
            scenario.schema_version
        ));
    }

    if scenario.nodes.is_empty() {
        reasons.push("scenario has no nodes".into());
        return reasons;
    }

    // Unique node ids.
    let mut ids: HashSet<&str> = HashSet::new();
    for node in &scenario.nodes {
        if !ids.insert(&node.id) {
            reasons.push(format!("duplicate node id \"{}\"", node.id));
        }
    }

    if !ids.contains(scenario.start_id.as_str()) {
        reasons.push(format!(
            "start_id \"{}\" does not reference a node",
            scenario.start_id
        ));
    }

    if !(0.0..=1.0).contains(&scenario.policy.drill_threshold) {
        reasons.push(format!(
            "policy.drill_threshold {} outside [0, 1]",
            scenario.policy.drill_threshold
        ));
    }

    // Per-node checks.
    for node in &scenario.nodes {
        if node.success_criteria.is_empty() {
            reasons.push(format!("node \"{}\" has empty success_criteria", node.id));
        }
        if !(0.0..=1.0).contains(&node.weight) {
            reasons.push(format!(
                "node \"{}\" weight {} outside [0, 1]",
                node.id, node.weight
            ));
        }
        for target in node.edges() {
            if target == node.id {
                reasons.push(format!("node \"{}\" transitions to itself", node.id));
            } else if !ids.contains(target) {
                reasons.push(format!(
                    "node \"{}\" references unknown node \"{target}\"",
                    node.id
                ));
            }
        }
    }

    // Terminal reachability: BFS from start over all edges; some reached
    // node must have a null pass or fail edge.
    if ids.contains(scenario.start_id.as_str()) && !terminal_reachable(scenario) {
        reasons.push(format!(
            "no path from start_id \"{}\" reaches a terminal node",
            scenario.start_id
        ));
    }

    reasons
}

fn terminal_reachable(scenario: &Scenario) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(&scenario.start_id);
    seen.insert(&scenario.start_id);

    while let Some(id) = queue.pop_front() {
        let Some(node) = scenario.node(id) else {
            continue;
        };
        // A turn ends on any null chosen edge, so a node missing either
        // the pass or the fail edge can terminate the interview.
        if node.next_if_pass.is_none() || node.next_if_fail.is_none() {
            return true;
        }
        for target in node.edges() {
            if seen.insert(target) {
                queue.push_back(target);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario(value: serde_json::Value) -> Scenario {
        serde_json::from_value(value).unwrap()
    }

    fn chain() -> serde_json::Value {
        json!({
            "id": "python_backend",
            "schema_version": 1,
            "policy": { "drill_threshold": 0.7 },
            "start_id": "l1",
            "nodes": [
                {
                    "id": "l1", "category": "python_backend",
                    "question": "Experience?", "success_criteria": ["python"],
                    "next_if_pass": "l2", "next_if_fail": "l2"
                },
                {
                    "id": "l2", "category": "python_backend",
                    "question": "Asyncio?", "success_criteria": ["event loop"]
                }
            ]
        })
    }

    #[test]
    fn valid_chain_passes() {
        assert!(validate(&scenario(chain())).is_empty());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut v = chain();
        v["nodes"][1]["id"] = json!("l1");
        let reasons = validate(&scenario(v));
        assert!(reasons.iter().any(|r| r.contains("duplicate node id")));
    }

    #[test]
    fn unknown_transition_rejected() {
        let mut v = chain();
        v["nodes"][0]["next_if_pass"] = json!("ghost");
        let reasons = validate(&scenario(v));
        assert!(reasons.iter().any(|r| r.contains("unknown node \"ghost\"")));
    }

    #[test]
    fn self_transition_rejected() {
        let mut v = chain();
        v["nodes"][0]["next_if_pass"] = json!("l1");
        let reasons = validate(&scenario(v));
        assert!(reasons.iter().any(|r| r.contains("transitions to itself")));
    }

    #[test]
    fn unreachable_terminal_rejected() {
        // l1 and l2 loop into each other with all edges populated.
        let v = json!({
            "id": "loop",
            "schema_version": 1,
            "start_id": "l1",
            "nodes": [
                {
                    "id": "l1", "category": "x", "question": "?",
                    "success_criteria": ["a"],
                    "next_if_pass": "l2", "next_if_fail": "l2", "next_if_equivalent": "l2"
                },
                {
                    "id": "l2", "category": "x", "question": "?",
                    "success_criteria": ["a"],
                    "next_if_pass": "l1", "next_if_fail": "l1", "next_if_equivalent": "l1"
                }
            ]
        });
        let reasons = validate(&scenario(v));
        assert!(reasons.iter().any(|r| r.contains("reaches a terminal")));
    }

    #[test]
    fn empty_criteria_rejected() {
        let mut v = chain();
        v["nodes"][1]["success_criteria"] = json!([]);
        let reasons = validate(&scenario(v));
        assert!(reasons.iter().any(|r| r.contains("empty success_criteria")));
    }

    #[test]
    fn bad_schema_version_rejected() {
        let mut v = chain();
        v["schema_version"] = json!(99);
        let reasons = validate(&scenario(v));
        assert!(reasons.iter().any(|r| r.contains("unsupported schema_version")));
    }

    #[test]
    fn weight_out_of_range_rejected() {
        let mut v = chain();
        v["nodes"][0]["weight"] = json!(1.5);
        let reasons = validate(&scenario(v));
        assert!(reasons.iter().any(|r| r.contains("outside [0, 1]")));
    }

    #[test]
    fn missing_start_rejected() {
        let mut v = chain();
        v["start_id"] = json!("nope");
        let reasons = validate(&scenario(v));
        assert!(reasons.iter().any(|r| r.contains("start_id")));
    }
}
