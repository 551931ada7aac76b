//! Hosted gateway adapter.
//!
//! Aggregators (OpenRouter and friends) speak the OpenAI wire but route
//! by `provider/model` ids and want attribution headers. Everything else
//! is delegated to the OpenAI-compatible adapter.

use hf_domain::config::LlmConfig;
use hf_domain::error::Result;

use crate::openai_compat::OpenAiCompatBackend;
use crate::traits::{ChatOptions, ChatResponse, LlmBackend};

pub struct HostedGatewayBackend {
    inner: OpenAiCompatBackend,
}

impl HostedGatewayBackend {
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        Ok(Self {
            inner: OpenAiCompatBackend::with_id("hosted_gateway", cfg)?,
        })
    }
}

#[async_trait::async_trait]
impl LlmBackend for HostedGatewayBackend {
    async fn complete(&self, opts: &ChatOptions) -> Result<ChatResponse> {
        self.inner.complete(opts).await
    }

    fn supports_schema_grammar(&self) -> bool {
        false
    }

    fn backend_id(&self) -> &str {
        "hosted_gateway"
    }
}
