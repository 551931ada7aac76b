//! Local grammar-capable inference server adapter (llama.cpp style).
//!
//! Talks to a llama-server `/completion` endpoint. When schema
//! enforcement is on, the reply schema rides along as a `json_schema`
//! grammar constraint, so the model physically cannot emit non-JSON.

use serde_json::Value;
use tokio::time::timeout_at;

use hf_domain::config::LlmConfig;
use hf_domain::error::{Error, Result};

use crate::traits::{ChatOptions, ChatResponse, LlmBackend};

pub struct LocalGrammarBackend {
    id: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl LocalGrammarBackend {
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("building http client: {e}")))?;

        Ok(Self {
            id: "local_grammar".into(),
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            model: cfg.model.clone(),
            client,
        })
    }

    fn build_body(&self, opts: &ChatOptions) -> Value {
        let prompt = format!(
            "<|system|>\n{}\n<|user|>\n{}\n<|assistant|>\n",
            opts.system, opts.user
        );
        let mut body = serde_json::json!({
            "prompt": prompt,
            "n_predict": opts.max_tokens,
            "temperature": opts.temperature,
            "cache_prompt": true,
        });
        if let Some(schema) = &opts.schema {
            body["json_schema"] = schema.clone();
        }
        body
    }
}

#[async_trait::async_trait]
impl LlmBackend for LocalGrammarBackend {
    async fn complete(&self, opts: &ChatOptions) -> Result<ChatResponse> {
        let url = format!("{}/completion", self.base_url);
        let body = self.build_body(opts);

        let response = timeout_at(opts.deadline, self.client.post(&url).json(&body).send())
            .await
            .map_err(|_| Error::DeadlineExceeded(format!("{}: completion", self.id)))?
            .map_err(|e| Error::UpstreamUnavailable(format!("{}: {e}", self.id)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "{}: server returned {status}",
                self.id
            )));
        }

        let parsed: Value = timeout_at(opts.deadline, response.json())
            .await
            .map_err(|_| Error::DeadlineExceeded(format!("{}: reading body", self.id)))?
            .map_err(|e| Error::UpstreamUnavailable(format!("{}: body: {e}", self.id)))?;

        let content = parsed["content"].as_str().unwrap_or_default().to_owned();

        Ok(ChatResponse {
            content,
            model: self.model.clone(),
        })
    }

    fn supports_schema_grammar(&self) -> bool {
        true
    }

    fn backend_id(&self) -> &str {
        &self.id
    }
}
