use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// The active backend. Selected once at startup — the hot path never
    /// dispatches on strings.
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Model identifier. Hosted gateways use `provider/model` ids.
    #[serde(default = "d_model")]
    pub model: String,
    /// Output token cap per reply; kept small to meet the turn SLA.
    #[serde(default = "d_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    /// Attach a JSON schema grammar when the backend supports it; request
    /// plain JSON mode otherwise.
    #[serde(default = "d_true")]
    pub json_schema_enforce: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            base_url: d_base_url(),
            auth: AuthConfig::default(),
            model: d_model(),
            max_tokens: d_max_tokens(),
            temperature: d_temperature(),
            json_schema_enforce: true,
        }
    }
}

/// The supported chat-completion backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local inference server with JSON-grammar support (llama.cpp style).
    #[default]
    LocalGrammar,
    /// Any endpoint following the OpenAI chat completions contract.
    OpenaiCompat,
    /// Hosted aggregator speaking the OpenAI wire with provider-prefixed
    /// model ids.
    HostedGateway,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Header name (e.g. "Authorization").
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix (e.g. "Bearer ").
    #[serde(default)]
    pub prefix: Option<String>,
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env).
    #[serde(default)]
    pub key: Option<String>,
}

impl AuthConfig {
    /// Resolve the API key, preferring the env var over the inline key.
    pub fn resolve_key(&self) -> Option<String> {
        if let Some(env) = &self.env {
            if let Ok(v) = std::env::var(env) {
                if !v.is_empty() {
                    return Some(v);
                }
            }
        }
        self.key.clone().filter(|k| !k.is_empty())
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_base_url() -> String {
    "http://127.0.0.1:8080".into()
}
fn d_model() -> String {
    "default".into()
}
fn d_max_tokens() -> u32 {
    96
}
fn d_temperature() -> f32 {
    0.7
}
fn d_true() -> bool {
    true
}
