//! Demo scenario synthesis for unknown ids.
//!
//! Keeps demos alive when a requested scenario was never uploaded: a
//! three-node chain using the requested id as the competence block.

use hf_domain::scenario::{Node, Scenario, ScenarioPolicy};

/// Synthesize an `L1 intro → L2 basics → L3 advanced` chain for `id`.
pub fn generate(id: &str) -> Scenario {
    let intro = format!("{id}_l1_intro");
    let basics = format!("{id}_l2_basics");
    let advanced = format!("{id}_l3_advanced");

    Scenario {
        id: id.to_owned(),
        schema_version: 1,
        policy: ScenarioPolicy::default(),
        start_id: intro.clone(),
        nodes: vec![
            Node {
                id: intro,
                category: id.to_owned(),
                order: 1,
                question: format!(
                    "Tell me about your hands-on experience with {id}: \
                     projects, responsibilities, and how long you have worked with it."
                ),
                weight: 0.8,
                success_criteria: vec![
                    id.to_owned(),
                    "experience".into(),
                    "project".into(),
                ],
                followups: vec!["What was your role on those projects?".into()],
                next_if_pass: Some(advanced.clone()),
                next_if_fail: Some(basics.clone()),
                next_if_equivalent: None,
            },
            Node {
                id: basics,
                category: id.to_owned(),
                order: 2,
                question: format!("Walk me through the fundamentals of {id}."),
                weight: 0.6,
                success_criteria: vec![id.to_owned(), "basics".into()],
                followups: vec![],
                next_if_pass: Some(advanced.clone()),
                next_if_fail: None,
                next_if_equivalent: None,
            },
            Node {
                id: advanced,
                category: id.to_owned(),
                order: 3,
                question: format!(
                    "Describe the hardest {id} problem you have solved and how you approached it."
                ),
                weight: 1.0,
                success_criteria: vec![id.to_owned(), "problem".into(), "solution".into()],
                followups: vec![],
                next_if_pass: None,
                next_if_fail: None,
                next_if_equivalent: None,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;

    #[test]
    fn generated_chain_is_valid() {
        let scenario = generate("golang");
        assert!(validate(&scenario).is_empty());
        assert_eq!(scenario.start_id, "golang_l1_intro");
        assert_eq!(scenario.nodes.len(), 3);
        assert!(scenario.nodes.iter().all(|n| n.category == "golang"));
    }

    #[test]
    fn pass_path_skips_basics() {
        let scenario = generate("sql");
        let intro = scenario.node("sql_l1_intro").unwrap();
        assert_eq!(intro.next_if_pass.as_deref(), Some("sql_l3_advanced"));
        assert_eq!(intro.next_if_fail.as_deref(), Some("sql_l2_basics"));
    }
}
