//! Backend construction.
//!
//! The backend variant is fixed at startup from config; the orchestrator
//! holds one `Arc<dyn LlmBackend>` for the life of the process.

use std::sync::Arc;

use hf_domain::config::{BackendKind, LlmConfig};
use hf_domain::error::Result;

use crate::gateway::HostedGatewayBackend;
use crate::local::LocalGrammarBackend;
use crate::openai_compat::OpenAiCompatBackend;
use crate::traits::LlmBackend;

/// Instantiate the configured backend.
pub fn build_backend(cfg: &LlmConfig) -> Result<Arc<dyn LlmBackend>> {
    let backend: Arc<dyn LlmBackend> = match cfg.backend {
        BackendKind::LocalGrammar => Arc::new(LocalGrammarBackend::from_config(cfg)?),
        BackendKind::OpenaiCompat => Arc::new(OpenAiCompatBackend::from_config(cfg)?),
        BackendKind::HostedGateway => Arc::new(HostedGatewayBackend::from_config(cfg)?),
    };
    tracing::info!(
        backend = backend.backend_id(),
        model = %cfg.model,
        base_url = %cfg.base_url,
        schema_grammar = backend.supports_schema_grammar(),
        "LLM backend ready"
    );
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_kind() {
        for kind in [
            BackendKind::LocalGrammar,
            BackendKind::OpenaiCompat,
            BackendKind::HostedGateway,
        ] {
            let cfg = LlmConfig {
                backend: kind,
                ..LlmConfig::default()
            };
            let backend = build_backend(&cfg).unwrap();
            assert!(!backend.backend_id().is_empty());
        }
    }

    #[test]
    fn only_local_advertises_grammar() {
        let local = build_backend(&LlmConfig {
            backend: BackendKind::LocalGrammar,
            ..LlmConfig::default()
        })
        .unwrap();
        let compat = build_backend(&LlmConfig {
            backend: BackendKind::OpenaiCompat,
            ..LlmConfig::default()
        })
        .unwrap();
        assert!(local.supports_schema_grammar());
        assert!(!compat.supports_schema_grammar());
    }
}
