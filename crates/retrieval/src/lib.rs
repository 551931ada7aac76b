//! Vector search over candidate resume chunks.
//!
//! The core treats retrieval as a read-only service: a turn asks for a
//! few chunks of resume context and moves on. Errors and timeouts never
//! fail a turn — the orchestrator just runs without cv_context.

mod rest;

pub use rest::RestResumeSearch;

use serde::{Deserialize, Serialize};

use hf_domain::error::Result;

/// One resume chunk returned by the search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeChunk {
    pub cv_id: String,
    pub chunk_text: String,
    pub score: f64,
}

/// Read-only resume search.
#[async_trait::async_trait]
pub trait ResumeSearch: Send + Sync {
    /// Return up to `top_k` chunks scoring at or above `threshold`.
    async fn search(&self, query: &str, top_k: usize, threshold: f64)
        -> Result<Vec<ResumeChunk>>;
}

/// Used when no retrieval endpoint is configured, and in tests.
pub struct NoopResumeSearch;

#[async_trait::async_trait]
impl ResumeSearch for NoopResumeSearch {
    async fn search(&self, _query: &str, _top_k: usize, _threshold: f64)
        -> Result<Vec<ResumeChunk>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_returns_empty() {
        let chunks = NoopResumeSearch.search("python", 3, 0.0).await.unwrap();
        assert!(chunks.is_empty());
    }
}
