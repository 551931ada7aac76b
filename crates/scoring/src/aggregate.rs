//! Score aggregation: block means, the weighted overall score, the
//! candidate-vs-required match score, and the performance analysis used
//! in final reports.

use std::collections::BTreeMap;

use serde::Serialize;

use hf_domain::scoring::{PerformanceLevel, QAnswer};

/// Weighted mean of a block's answer scores, weights normalized within
/// the block. A block with no answers (or all-zero weights) scores 0.
pub fn score_block(answers: &[QAnswer], block: &str) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for a in answers.iter().filter(|a| a.block == block) {
        weighted_sum += a.score * a.weight;
        weight_sum += a.weight;
    }
    if weight_sum > 0.0 {
        weighted_sum / weight_sum
    } else {
        0.0
    }
}

/// All block scores derived from an answer list.
pub fn all_block_scores(answers: &[QAnswer]) -> BTreeMap<String, f64> {
    let mut blocks: Vec<&str> = answers.iter().map(|a| a.block.as_str()).collect();
    blocks.sort_unstable();
    blocks.dedup();
    blocks
        .into_iter()
        .map(|b| (b.to_owned(), score_block(answers, b)))
        .collect()
}

/// Weighted overall score. Blocks absent from the weight table are
/// ignored; blocks weighted but unanswered contribute zero.
pub fn score_overall(
    block_scores: &BTreeMap<String, f64>,
    block_weights: &BTreeMap<String, f64>,
) -> f64 {
    block_weights
        .iter()
        .map(|(block, weight)| block_scores.get(block).copied().unwrap_or(0.0) * weight)
        .sum()
}

/// How well a candidate's block scores cover a role's requirements:
/// `Σ min(candidate[b], required[b]) × w[b] / Σ required[b] × w[b]`,
/// clamped to [0, 1].
pub fn match_score(
    candidate: &BTreeMap<String, f64>,
    required: &BTreeMap<String, f64>,
    weights: &BTreeMap<String, f64>,
) -> f64 {
    let mut covered = 0.0;
    let mut demanded = 0.0;
    for (block, req) in required {
        let w = weights.get(block).copied().unwrap_or(0.0);
        let have = candidate.get(block).copied().unwrap_or(0.0);
        covered += have.min(*req) * w;
        demanded += req * w;
    }
    if demanded > 0.0 {
        (covered / demanded).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Performance analysis
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Score at which a block counts as a strength.
const STRENGTH_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceAnalysis {
    pub level: PerformanceLevel,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

impl PerformanceAnalysis {
    pub fn from_scores(block_scores: &BTreeMap<String, f64>, overall: f64) -> Self {
        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        for (block, score) in block_scores {
            if *score >= STRENGTH_THRESHOLD {
                strengths.push(block.clone());
            } else {
                weaknesses.push(block.clone());
            }
        }
        Self {
            level: PerformanceLevel::from_overall(overall),
            strengths,
            weaknesses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(block: &str, score: f64, weight: f64) -> QAnswer {
        QAnswer {
            question_id: format!("{block}_q"),
            block: block.into(),
            score,
            weight,
        }
    }

    #[test]
    fn block_mean_normalizes_weights() {
        let answers = vec![
            answer("python", 1.0, 1.0),
            answer("python", 0.5, 1.0),
            answer("sql", 0.0, 1.0),
        ];
        assert!((score_block(&answers, "python") - 0.75).abs() < 1e-9);
        assert_eq!(score_block(&answers, "sql"), 0.0);
        assert_eq!(score_block(&answers, "missing"), 0.0);
    }

    #[test]
    fn block_mean_respects_weights() {
        let answers = vec![answer("python", 1.0, 0.8), answer("python", 0.0, 0.2)];
        assert!((score_block(&answers, "python") - 0.8).abs() < 1e-9);
    }

    #[test]
    fn aggregation_is_order_invariant() {
        let mut answers = vec![
            answer("python", 0.7, 1.0),
            answer("sql", 0.3, 0.5),
            answer("python", 1.0, 0.5),
        ];
        let forward = all_block_scores(&answers);
        answers.reverse();
        let reversed = all_block_scores(&answers);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn overall_ignores_unweighted_blocks() {
        let scores = BTreeMap::from([("python".to_string(), 1.0), ("trivia".to_string(), 1.0)]);
        let weights = BTreeMap::from([("python".to_string(), 0.6), ("sql".to_string(), 0.4)]);
        // trivia ignored; sql unanswered contributes zero.
        assert!((score_overall(&scores, &weights) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn scores_are_monotone_in_answer_score() {
        let base = vec![answer("python", 0.3, 1.0), answer("python", 0.7, 0.5)];
        let mut improved = base.clone();
        improved[0].score = 0.9;

        let weights = BTreeMap::from([("python".to_string(), 1.0)]);
        let before = score_overall(&all_block_scores(&base), &weights);
        let after = score_overall(&all_block_scores(&improved), &weights);
        assert!(after >= before);
    }

    #[test]
    fn match_score_clamps_and_weights() {
        let candidate = BTreeMap::from([("hw".to_string(), 0.9), ("net".to_string(), 0.2)]);
        let required = BTreeMap::from([("hw".to_string(), 0.7), ("net".to_string(), 0.5)]);
        let weights = BTreeMap::from([("hw".to_string(), 0.5), ("net".to_string(), 0.5)]);
        // covered = min(.9,.7)*.5 + min(.2,.5)*.5 = .35 + .1 = .45
        // demanded = .7*.5 + .5*.5 = .6
        let m = match_score(&candidate, &required, &weights);
        assert!((m - 0.75).abs() < 1e-9);
    }

    #[test]
    fn match_score_empty_requirements() {
        let empty = BTreeMap::new();
        assert_eq!(match_score(&empty, &empty, &empty), 0.0);
    }

    #[test]
    fn analysis_splits_strengths_and_weaknesses() {
        let scores = BTreeMap::from([
            ("python".to_string(), 0.8),
            ("sql".to_string(), 0.69),
            ("ops".to_string(), 0.7),
        ]);
        let analysis = PerformanceAnalysis::from_scores(&scores, 0.74);
        assert_eq!(analysis.strengths, vec!["ops", "python"]);
        assert_eq!(analysis.weaknesses, vec!["sql"]);
        assert_eq!(analysis.level, PerformanceLevel::Meets);
    }
}
