use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Resume retrieval
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RetrievalConfig {
    /// Base URL of the resume vector-search service. `None` disables
    /// retrieval (turns run without cv_context).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "d_top_k")]
    pub top_k: usize,
    /// Minimum similarity score for a chunk to be injected.
    #[serde(default)]
    pub threshold: f64,
}

fn d_timeout_ms() -> u64 {
    800
}
fn d_top_k() -> usize {
    3
}
