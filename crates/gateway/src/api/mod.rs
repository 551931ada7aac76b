pub mod admin;
pub mod scenario;
pub mod score;
pub mod session;
pub mod turn;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post};
use axum::Router;

use hf_domain::error::Error;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        // Turns
        .route("/turn", post(turn::submit_turn))
        // Sessions
        .route("/session/start", post(session::start_session))
        .route("/session/end", post(session::end_session))
        .route("/session/:id/events", get(session::session_events))
        .route("/session/:id/report", get(session::session_report))
        // Scenarios
        .route("/scenario", post(scenario::upload_scenario))
        .route("/scenario/:id", get(scenario::get_scenario))
        .route("/scenario/:id", delete(scenario::delete_scenario))
        .route("/scenarios", get(scenario::list_scenarios))
        // Scoring
        .route("/score/aggregate", post(score::aggregate))
        // Health & metrics
        .route("/health", get(admin::health))
        .route("/metrics/summary", get(admin::metrics_summary))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Map a domain error onto an HTTP response.
pub(crate) fn error_response(e: &Error) -> axum::response::Response {
    let status = match e {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) | Error::Cancelled => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}
