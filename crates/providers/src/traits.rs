use serde_json::Value;
use tokio::time::Instant;

use hf_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A backend-agnostic chat completion request.
///
/// The deadline is absolute: adapters wrap their HTTP call in
/// `timeout_at(deadline)` and return `Error::DeadlineExceeded` once it
/// passes, aborting the in-flight request.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub system: String,
    pub user: String,
    /// JSON schema for the reply. Grammar-capable backends attach it as
    /// a constraint; OpenAI-wire backends downgrade to JSON mode.
    pub schema: Option<Value>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub deadline: Instant,
}

/// A backend-agnostic chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Raw textual content of the reply.
    pub content: String,
    /// The model that produced it.
    pub model: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Backend trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trait every LLM backend adapter implements.
///
/// Implementations translate between [`ChatOptions`] and the wire format
/// of their endpoint. Errors map onto the shared error kinds:
/// 5xx / connection failures → `UpstreamUnavailable` (retryable once by
/// the caller when ≥ 1 s of budget remains), elapsed deadline →
/// `DeadlineExceeded`.
#[async_trait::async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send one chat completion request and wait for the full response.
    async fn complete(&self, opts: &ChatOptions) -> Result<ChatResponse>;

    /// Whether this backend enforces JSON output with a schema grammar
    /// (rather than best-effort JSON mode).
    fn supports_schema_grammar(&self) -> bool;

    /// A unique identifier for this backend instance.
    fn backend_id(&self) -> &str;
}
