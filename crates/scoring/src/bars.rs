//! Behaviorally-Anchored Rating Scales scoring.
//!
//! A transcript is scored against a node's success criteria with three
//! matching tiers (exact substring, whole word, stemmed) and snapped to
//! one of four anchors tied to observable behavior.

use hf_domain::scoring::AnswerScore;

use crate::text::{char_len, stem, tokenize};

/// Score one transcript against a node's criteria.
///
/// `weight` is carried by the caller into the committed `QAnswer`; the
/// raw answer score itself is weight-independent.
pub fn score_answer(transcript: &str, criteria: &[String]) -> AnswerScore {
    let transcript_lc = transcript.to_lowercase();
    let tokens = tokenize(transcript);
    let stems: Vec<String> = tokens.iter().map(|t| stem(t)).collect();

    let matched_criteria: Vec<String> = criteria
        .iter()
        .filter(|c| criterion_matches(c, &transcript_lc, &tokens, &stems))
        .cloned()
        .collect();

    let coverage = if criteria.is_empty() {
        0.0
    } else {
        matched_criteria.len() as f64 / criteria.len() as f64
    };

    let len = char_len(transcript.trim());
    let score = anchor(coverage, len, matched_criteria.is_empty());

    let length_factor = (tokens.len() as f64 / 40.0).min(1.0) * 0.3;
    let confidence = (coverage + length_factor).min(1.0);

    AnswerScore {
        score,
        confidence,
        matched_criteria,
    }
}

/// Snap raw coverage to the BARS anchors.
///
/// Checked in severity order; a high-coverage answer that is still too
/// short for the top anchor lands on 0.7.
fn anchor(coverage: f64, transcript_chars: usize, no_matches: bool) -> f64 {
    if no_matches && transcript_chars < 20 {
        0.0
    } else if coverage < 0.33 || transcript_chars < 60 {
        0.3
    } else if coverage >= 0.75 && transcript_chars >= 120 {
        1.0
    } else {
        0.7
    }
}

/// A criterion matches as (a) an exact substring, (b) a whole word, or
/// (c) a stemmed single word.
fn criterion_matches(
    criterion: &str,
    transcript_lc: &str,
    tokens: &[String],
    stems: &[String],
) -> bool {
    let c = criterion.trim().to_lowercase();
    if c.is_empty() {
        return false;
    }

    // (a) exact substring — covers multi-word criteria.
    if transcript_lc.contains(&c) {
        return true;
    }

    // (b) whole-word match.
    if tokens.iter().any(|t| t == &c) {
        return true;
    }

    // (c) stemmed match, single-word criteria only.
    if !c.contains(char::is_whitespace) {
        let c_stem = stem(&c);
        return stems.iter().any(|s| s == &c_stem);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn full_coverage_long_answer_hits_top_anchor() {
        let transcript = "I have worked with python for five years, designed \
                          asyncio services, and shipped large projects with \
                          extensive testing and monitoring in production.";
        let result = score_answer(transcript, &criteria(&["python", "asyncio", "projects"]));
        assert_eq!(result.score, 1.0);
        assert_eq!(result.matched_criteria.len(), 3);
    }

    #[test]
    fn full_coverage_medium_answer_lands_on_point_seven() {
        // All criteria hit, but under 120 chars.
        let transcript = "Работал с Python 5 лет, опыт больших проектов, микросервисы.";
        let result = score_answer(transcript, &criteria(&["python", "опыт", "проекты"]));
        assert_eq!(result.score, 0.7);
        assert_eq!(result.matched_criteria.len(), 3);
    }

    #[test]
    fn empty_answer_hits_zero_anchor() {
        let result = score_answer("не помню", &criteria(&["python", "опыт"]));
        assert_eq!(result.score, 0.0);
        assert!(result.matched_criteria.is_empty());
        assert!(result.confidence < 0.3);
    }

    #[test]
    fn low_coverage_lands_on_point_three() {
        let transcript = "Я занимался только поддержкой серверов и немного писал \
                          скрипты для автоматизации рутинных задач.";
        let result = score_answer(transcript, &criteria(&["python", "docker", "kubernetes"]));
        assert_eq!(result.score, 0.3);
    }

    #[test]
    fn stemmed_match_covers_inflected_forms() {
        let transcript = "пять лет опыта на крупных проектах с микросервисами и очередями";
        let result = score_answer(transcript, &criteria(&["проекты"]));
        assert_eq!(result.matched_criteria, vec!["проекты".to_string()]);
    }

    #[test]
    fn multiword_criterion_matches_as_substring() {
        let transcript = "The event loop schedules tasks cooperatively and yields on await.";
        let result = score_answer(transcript, &criteria(&["event loop"]));
        assert_eq!(result.matched_criteria.len(), 1);
    }

    #[test]
    fn no_criteria_scores_short_circuit() {
        let result = score_answer("anything at all", &[]);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn confidence_grows_with_length() {
        let short = score_answer("python", &criteria(&["python"]));
        let long_transcript = "python ".repeat(40);
        let long = score_answer(&long_transcript, &criteria(&["python"]));
        assert!(long.confidence > short.confidence);
        assert!(long.confidence <= 1.0);
    }
}
