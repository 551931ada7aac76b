//! Health probe and metrics snapshot.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "scenario_count": state.scenarios.len(),
        "active_sessions": state.sessions.active_count(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Most recent samples to consider per stage; 0 or absent = all
    /// retained samples.
    #[serde(default)]
    pub window: usize,
}

pub async fn metrics_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> impl IntoResponse {
    Json(state.metrics.summary(query.window))
}
