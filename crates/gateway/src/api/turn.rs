//! `POST /turn` — submit a finalized transcript for the session's
//! current question.
//!
//! Synchronous by default: the handler drains the turn's event channel
//! and answers once the turn completes. With `"async": true` the turn
//! is accepted with 202 and the caller follows the session event
//! stream instead.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use hf_domain::error::Error;

use crate::runtime::{run_turn, TurnEvent, TurnInput};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TurnBody {
    pub session_id: String,
    pub transcript: String,
    /// When true, return 202 immediately; events arrive on
    /// `/session/{id}/events`.
    #[serde(default, rename = "async")]
    pub async_mode: bool,
}

pub async fn submit_turn(
    State(state): State<AppState>,
    Json(body): Json<TurnBody>,
) -> impl IntoResponse {
    let session_id = body.session_id.clone();
    let mut rx = match run_turn(
        state,
        TurnInput {
            session_id: body.session_id,
            transcript: body.transcript,
        },
    ) {
        Ok(rx) => rx,
        Err(e) => return crate::api::error_response(&e),
    };

    if body.async_mode {
        // The pipeline keeps running; its events land on the session bus.
        return (
            StatusCode::ACCEPTED,
            [(
                header::LOCATION,
                format!("/session/{session_id}/events"),
            )],
            Json(serde_json::json!({ "accepted": true })),
        )
            .into_response();
    }

    // Drain the private channel until the turn resolves one way or the
    // other. Backchannel events are only useful on the live stream.
    while let Some(event) = rx.recv().await {
        match event {
            TurnEvent::Backchannel { .. } => continue,
            TurnEvent::Completed(completed) => {
                return Json(completed).into_response();
            }
            TurnEvent::Cancelled => {
                return crate::api::error_response(&Error::Cancelled);
            }
            TurnEvent::Error { message } => {
                return crate::api::error_response(&Error::InvalidInput(message));
            }
        }
    }

    // Channel closed without a terminal event — the pipeline panicked.
    crate::api::error_response(&Error::UpstreamUnavailable(
        "turn pipeline terminated unexpectedly".into(),
    ))
}
