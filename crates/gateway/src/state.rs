use std::sync::Arc;

use hf_domain::config::Config;
use hf_providers::LlmBackend;
use hf_retrieval::ResumeSearch;
use hf_scenario::{RoleProfileStore, ScenarioStore};
use hf_sessions::SessionStore;

use crate::runtime::metrics::MetricsRecorder;

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Read-mostly stores** — scenarios, role profiles
/// - **Session management** — the live session map
/// - **Upstreams** — the LLM backend and resume retrieval
/// - **Telemetry** — the metrics recorder
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    // ── Read-mostly stores ────────────────────────────────────────────
    pub scenarios: Arc<ScenarioStore>,
    pub profiles: Arc<RoleProfileStore>,

    // ── Session management ────────────────────────────────────────────
    pub sessions: Arc<SessionStore>,

    // ── Upstreams ─────────────────────────────────────────────────────
    pub llm: Arc<dyn LlmBackend>,
    pub retrieval: Arc<dyn ResumeSearch>,

    // ── Telemetry ─────────────────────────────────────────────────────
    pub metrics: Arc<MetricsRecorder>,
}
