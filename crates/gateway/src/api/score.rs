//! Stateless score aggregation endpoint.
//!
//! Used by report tooling and batch re-scoring: no session involved,
//! just answers in, block/overall scores and the analysis out.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use hf_domain::scoring::QAnswer;
use hf_scoring::{aggregate, PerformanceAnalysis};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AggregateBody {
    pub answers: Vec<QAnswer>,
    #[serde(default)]
    pub block_weights: BTreeMap<String, f64>,
}

pub async fn aggregate(
    State(_state): State<AppState>,
    Json(body): Json<AggregateBody>,
) -> impl IntoResponse {
    let block_scores = aggregate::all_block_scores(&body.answers);
    let overall = aggregate::score_overall(&block_scores, &body.block_weights);
    let analysis = PerformanceAnalysis::from_scores(&block_scores, overall);

    Json(serde_json::json!({
        "block_scores": block_scores,
        "overall": overall,
        "overall_percentage": (overall * 100.0).round(),
        "analysis": analysis,
    }))
}
