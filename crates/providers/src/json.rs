//! JSON handling for interviewer replies.
//!
//! Backends return raw text. The strict path parses it directly; the
//! lenient path extracts the largest JSON-looking substring (models love
//! to wrap JSON in prose or code fences). Anything that fails both is a
//! parse failure — the orchestrator then builds the turn from the
//! heuristic path instead.

use serde::Deserialize;
use serde_json::Value;

use hf_domain::scoring::ScoringUpdate;

/// The structured reply the interviewer prompt asks for.
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewerReply {
    pub reply: String,
    #[serde(default)]
    pub next_node_id: Option<String>,
    pub scoring_update: ReplyScoringUpdate,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

/// `scoring_update` as emitted by the model; `delta` is optional because
/// the model cannot know the block history.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyScoringUpdate {
    pub block: String,
    #[serde(default)]
    pub delta: f64,
    pub score: f64,
}

impl InterviewerReply {
    pub fn scoring_update(&self) -> ScoringUpdate {
        ScoringUpdate {
            block: self.scoring_update.block.clone(),
            delta: self.scoring_update.delta,
            score: self.scoring_update.score.clamp(0.0, 1.0),
        }
    }
}

/// Parse a model response: strict JSON first, then the largest JSON
/// substring. `None` means both attempts failed.
pub fn parse_reply(raw: &str) -> Option<InterviewerReply> {
    if let Ok(reply) = serde_json::from_str::<InterviewerReply>(raw) {
        return Some(reply);
    }
    let candidate = extract_json(raw)?;
    serde_json::from_str(&candidate).ok()
}

/// Extract the largest balanced `{...}` substring that parses as JSON.
pub fn extract_json(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut best: Option<&str> = None;

    for (start, _) in raw.char_indices().filter(|(_, c)| *c == '{') {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, b) in bytes[start..].iter().enumerate() {
            match b {
                b'"' if !escaped => in_string = !in_string,
                b'\\' if in_string && !escaped => {
                    escaped = true;
                    continue;
                }
                b'{' if !in_string => depth += 1,
                b'}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        let candidate = &raw[start..start + offset + 1];
                        if candidate.len() > best.map_or(0, str::len)
                            && serde_json::from_str::<Value>(candidate).is_ok()
                        {
                            best = Some(candidate);
                        }
                        break;
                    }
                }
                _ => {}
            }
            escaped = false;
        }
    }

    best.map(str::to_owned)
}

/// JSON schema for [`InterviewerReply`], attached as a grammar by
/// schema-capable backends.
pub fn reply_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "reply": { "type": "string" },
            "next_node_id": { "type": ["string", "null"] },
            "scoring_update": {
                "type": "object",
                "properties": {
                    "block": { "type": "string" },
                    "delta": { "type": "number" },
                    "score": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
                },
                "required": ["block", "score"]
            },
            "red_flags": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["reply", "scoring_update"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "reply": "Расскажите подробнее про асинхронность.",
        "next_node_id": "python_l3_advanced",
        "scoring_update": { "block": "python_backend", "score": 0.8 },
        "red_flags": []
    }"#;

    #[test]
    fn strict_parse() {
        let reply = parse_reply(VALID).expect("valid JSON parses");
        assert_eq!(reply.next_node_id.as_deref(), Some("python_l3_advanced"));
        assert_eq!(reply.scoring_update.block, "python_backend");
        assert_eq!(reply.scoring_update().score, 0.8);
    }

    #[test]
    fn fenced_json_extracted() {
        let wrapped = format!("Here is my assessment:\n```json\n{VALID}\n```\nDone.");
        let reply = parse_reply(&wrapped).expect("fenced JSON extracted");
        assert_eq!(reply.scoring_update.block, "python_backend");
    }

    #[test]
    fn largest_object_wins() {
        let raw = format!("{{\"a\": 1}} some text {VALID}");
        let reply = parse_reply(&raw).expect("larger object chosen");
        assert!(!reply.reply.is_empty());
    }

    #[test]
    fn garbage_fails_both_paths() {
        assert!(parse_reply("the candidate seems fine, score high").is_none());
        assert!(parse_reply("{ broken json").is_none());
    }

    #[test]
    fn braces_inside_strings_ignored() {
        let raw = r#"{"reply": "use {braces} carefully", "scoring_update": {"block": "b", "score": 0.5}}"#;
        let reply = parse_reply(raw).expect("string braces ignored");
        assert_eq!(reply.reply, "use {braces} carefully");
    }

    #[test]
    fn score_clamped() {
        let raw = r#"{"reply": "x", "scoring_update": {"block": "b", "score": 1.7}}"#;
        let reply = parse_reply(raw).unwrap();
        assert_eq!(reply.scoring_update().score, 1.0);
    }

    #[test]
    fn schema_names_required_fields() {
        let schema = reply_schema();
        assert_eq!(schema["required"][0], "reply");
        assert_eq!(schema["required"][1], "scoring_update");
    }
}
