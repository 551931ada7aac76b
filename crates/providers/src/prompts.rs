//! Interviewer prompt assembly.
//!
//! The system prompt fixes the role and the output contract; the user
//! prompt carries the turn context as a JSON document so the model sees
//! exactly what the orchestrator sees.

use std::collections::BTreeMap;

use serde_json::json;

use hf_domain::profile::RoleProfile;
use hf_domain::scenario::Node;

/// System prompt: interviewer persona plus the JSON output contract.
pub fn system_prompt(role_id: &str) -> String {
    format!(
        "You are a professional job interviewer for the role \"{role_id}\". \
         Assess the candidate's latest answer against the current question's \
         success criteria, respond concisely in the candidate's language, and \
         return ONLY a JSON object with fields `reply` (your next utterance), \
         `next_node_id` (the id of the next question node, or null to end), \
         `scoring_update` (object with `block`, `score` in [0,1]), and \
         `red_flags` (array of strings, empty if none)."
    )
}

/// User prompt: the turn context as JSON.
pub fn user_prompt(
    node: &Node,
    transcript: &str,
    current_scores: &BTreeMap<String, f64>,
    profile: &RoleProfile,
    cv_context: &[String],
) -> String {
    let context = json!({
        "node": {
            "id": node.id,
            "category": node.category,
            "question": node.question,
            "success_criteria": node.success_criteria,
            "followups": node.followups,
            "next_if_pass": node.next_if_pass,
            "next_if_fail": node.next_if_fail,
            "next_if_equivalent": node.next_if_equivalent,
        },
        "transcript": transcript,
        "current_scores": current_scores,
        "role_profile": {
            "id": profile.id,
            "block_weights": profile.block_weights,
            "critical_blocks": profile.critical_blocks,
        },
        "cv_context": cv_context,
    });
    format!(
        "Interview turn context:\n{}\n\nScore the answer and choose the next node.",
        serde_json::to_string_pretty(&context).unwrap_or_default()
    )
}
