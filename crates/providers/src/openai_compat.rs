//! OpenAI-compatible adapter.
//!
//! Works with OpenAI, Azure OpenAI, Ollama, vLLM, LM Studio, and any
//! other endpoint following the OpenAI chat completions contract.

use serde_json::Value;
use tokio::time::timeout_at;

use hf_domain::config::LlmConfig;
use hf_domain::error::{Error, Result};

use crate::traits::{ChatOptions, ChatResponse, LlmBackend};

/// An adapter for any OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompatBackend {
    id: String,
    base_url: String,
    api_key: Option<String>,
    auth_header: String,
    auth_prefix: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        Self::with_id("openai_compat", cfg)
    }

    pub(crate) fn with_id(id: &str, cfg: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("building http client: {e}")))?;

        Ok(Self {
            id: id.into(),
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key: cfg.auth.resolve_key(),
            auth_header: cfg
                .auth
                .header
                .clone()
                .unwrap_or_else(|| "Authorization".into()),
            auth_prefix: cfg.auth.prefix.clone().unwrap_or_else(|| "Bearer ".into()),
            model: cfg.model.clone(),
            client,
        })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        let mut rb = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            rb = rb.header(&self.auth_header, format!("{}{key}", self.auth_prefix));
        }
        rb
    }

    fn build_body(&self, opts: &ChatOptions) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": opts.system },
                { "role": "user", "content": opts.user },
            ],
            "temperature": opts.temperature,
            "max_tokens": opts.max_tokens,
            "stream": false,
        });
        // The OpenAI wire has no grammar slot; downgrade the schema to
        // plain JSON mode.
        if opts.schema.is_some() {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }
        body
    }
}

#[async_trait::async_trait]
impl LlmBackend for OpenAiCompatBackend {
    async fn complete(&self, opts: &ChatOptions) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(opts);

        let response = timeout_at(opts.deadline, self.authed_post(&url).json(&body).send())
            .await
            .map_err(|_| Error::DeadlineExceeded(format!("{}: chat completion", self.id)))?
            .map_err(|e| Error::UpstreamUnavailable(format!("{}: {e}", self.id)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(Error::UpstreamUnavailable(format!(
                "{}: upstream returned {status}",
                self.id
            )));
        }
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "{}: request rejected with {status}",
                self.id
            )));
        }

        let parsed: Value = timeout_at(opts.deadline, response.json())
            .await
            .map_err(|_| Error::DeadlineExceeded(format!("{}: reading body", self.id)))?
            .map_err(|e| Error::UpstreamUnavailable(format!("{}: body: {e}", self.id)))?;

        let content = parsed["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_owned();
        let model = parsed["model"].as_str().unwrap_or(&self.model).to_owned();

        Ok(ChatResponse { content, model })
    }

    fn supports_schema_grammar(&self) -> bool {
        false
    }

    fn backend_id(&self) -> &str {
        &self.id
    }
}
