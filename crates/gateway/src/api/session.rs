//! Session lifecycle endpoints and the per-session event stream.

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json};
use futures_util::stream::Stream;
use serde::Deserialize;
use tokio::sync::broadcast;

use hf_domain::error::Error;
use hf_domain::turn::SessionEvent;
use hf_scoring::PerformanceAnalysis;

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /session/start
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct StartSessionBody {
    pub candidate_id: String,
    pub role_profile_id: String,
    /// Explicit scenario override. Falls back to the role profile's
    /// pinned scenario, then to the role id itself.
    #[serde(default)]
    pub scenario_id: Option<String>,
}

pub async fn start_session(
    State(state): State<AppState>,
    Json(body): Json<StartSessionBody>,
) -> impl IntoResponse {
    if body.candidate_id.trim().is_empty() || body.role_profile_id.trim().is_empty() {
        return crate::api::error_response(&Error::InvalidInput(
            "candidate_id and role_profile_id must not be empty".into(),
        ));
    }

    let profile = state.profiles.get(&body.role_profile_id);
    let scenario_id = body
        .scenario_id
        .or_else(|| profile.scenario_id.clone())
        .unwrap_or_else(|| body.role_profile_id.clone());

    let scenario = if state.config.scenario.allow_fallback {
        state.scenarios.get_or_fallback(&scenario_id)
    } else {
        match state.scenarios.get(&scenario_id) {
            Some(s) => s,
            None => {
                return crate::api::error_response(&Error::NotFound(format!(
                    "scenario \"{scenario_id}\""
                )))
            }
        }
    };

    match state.sessions.begin(
        &body.candidate_id,
        &body.role_profile_id,
        &scenario.id,
        &scenario.start_id,
    ) {
        Ok(cell) => Json(serde_json::json!({
            "session_id": cell.session_id,
            "start_node_id": scenario.start_id,
        }))
        .into_response(),
        Err(e) => crate::api::error_response(&e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /session/end
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct EndSessionBody {
    pub session_id: String,
}

pub async fn end_session(
    State(state): State<AppState>,
    Json(body): Json<EndSessionBody>,
) -> impl IntoResponse {
    match state.sessions.end(&body.session_id) {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => crate::api::error_response(&e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /session/:id/events
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Server-sent stream of `backchannel` and `turn_complete` events.
pub async fn session_events(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Some(cell) = state.sessions.get(&session_id) else {
        return crate::api::error_response(&Error::NotFound(format!(
            "session \"{session_id}\""
        )));
    };

    let rx = cell.subscribe();
    Sse::new(event_stream(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn event_stream(
    mut rx: broadcast::Receiver<SessionEvent>,
) -> impl Stream<Item = Result<Event, std::convert::Infallible>> {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let name = match &event {
                        SessionEvent::Backchannel { .. } => "backchannel",
                        SessionEvent::TurnComplete(_) => "turn_complete",
                    };
                    let data = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok(Event::default().event(name).data(data));
                }
                // Skipped events are lost to this subscriber; keep going.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /session/:id/report
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The scored summary consumed by downstream report rendering.
pub async fn session_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let Some(cell) = state.sessions.get(&session_id) else {
        return crate::api::error_response(&Error::NotFound(format!(
            "session \"{session_id}\""
        )));
    };

    let s = cell.lock_state().await;
    let analysis = PerformanceAnalysis::from_scores(&s.block_scores, s.overall_score);
    Json(serde_json::json!({
        "session_id": s.session_id,
        "candidate_id": s.candidate_id,
        "scenario_id": s.scenario_id,
        "role_profile_id": s.role_profile_id,
        "terminal": s.is_terminal(),
        "turns": s.turn_seq,
        "block_scores": s.block_scores,
        "overall": s.overall_score,
        "overall_percentage": (s.overall_score * 100.0).round(),
        "analysis": analysis,
        "red_flags": s.red_flags,
        "history": s.history,
    }))
    .into_response()
}
