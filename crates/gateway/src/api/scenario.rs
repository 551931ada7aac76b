//! Scenario management endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use hf_domain::error::Error;
use hf_domain::scenario::Scenario;

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /scenario
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn upload_scenario(
    State(state): State<AppState>,
    Json(scenario): Json<Scenario>,
) -> impl IntoResponse {
    // Validate first so the response carries the full reason list, not
    // the store's joined summary.
    let reasons = hf_scenario::validate::validate(&scenario);
    if !reasons.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "errors": reasons })),
        )
            .into_response();
    }

    match state.scenarios.load(scenario) {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e @ Error::Fatal(_)) => {
            // Storage write corruption is unrecoverable by contract.
            tracing::error!(error = %e, "fatal scenario storage error");
            std::process::exit(3);
        }
        Err(e) => crate::api::error_response(&e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /scenario/:id · DELETE /scenario/:id · GET /scenarios
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.scenarios.get(&id) {
        Some(scenario) => Json(scenario.as_ref().clone()).into_response(),
        None => crate::api::error_response(&Error::NotFound(format!("scenario \"{id}\""))),
    }
}

pub async fn delete_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.scenarios.delete(&id) {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e @ Error::Fatal(_)) => {
            tracing::error!(error = %e, "fatal scenario storage error");
            std::process::exit(3);
        }
        Err(e) => crate::api::error_response(&e),
    }
}

pub async fn list_scenarios(State(state): State<AppState>) -> impl IntoResponse {
    let ids = state.scenarios.list();
    Json(serde_json::json!({
        "scenarios": ids,
        "count": ids.len(),
    }))
}
