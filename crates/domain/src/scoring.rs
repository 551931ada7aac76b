//! Scoring records shared between the scorer, the orchestrator, and the
//! session store.

use serde::{Deserialize, Serialize};

/// A scored answer to one question node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QAnswer {
    pub question_id: String,
    /// Competence block the question belongs to.
    pub block: String,
    /// Score in [0, 1].
    pub score: f64,
    /// Question weight in [0, 1].
    pub weight: f64,
}

/// Result of scoring one transcript against a node's criteria.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerScore {
    /// BARS-anchored score in [0, 1].
    pub score: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Criteria the transcript covered.
    pub matched_criteria: Vec<String>,
}

/// The per-turn score delta committed into the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringUpdate {
    pub block: String,
    /// Change to the block score caused by this answer.
    pub delta: f64,
    /// The answer's score.
    pub score: f64,
}

/// Overall performance buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Below,
    Approaching,
    Meets,
    Exceeds,
}

impl PerformanceLevel {
    pub fn from_overall(overall: f64) -> Self {
        if overall < 0.3 {
            Self::Below
        } else if overall < 0.7 {
            Self::Approaching
        } else if overall < 0.85 {
            Self::Meets
        } else {
            Self::Exceeds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_buckets() {
        assert_eq!(PerformanceLevel::from_overall(0.0), PerformanceLevel::Below);
        assert_eq!(
            PerformanceLevel::from_overall(0.299),
            PerformanceLevel::Below
        );
        assert_eq!(
            PerformanceLevel::from_overall(0.3),
            PerformanceLevel::Approaching
        );
        assert_eq!(PerformanceLevel::from_overall(0.7), PerformanceLevel::Meets);
        assert_eq!(
            PerformanceLevel::from_overall(0.85),
            PerformanceLevel::Exceeds
        );
        assert_eq!(PerformanceLevel::from_overall(1.0), PerformanceLevel::Exceeds);
    }
}
