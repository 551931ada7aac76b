//! REST implementation of [`ResumeSearch`].
//!
//! Wraps a `reqwest::Client` against the resume search API. Single
//! attempt, tight timeout — the turn budget cannot afford retries here.

use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use hf_domain::config::RetrievalConfig;
use hf_domain::error::{Error, Result};

use crate::{ResumeChunk, ResumeSearch};

/// A REST-based resume search client. Created once and reused for the
/// lifetime of the process; the underlying client pools connections.
#[derive(Debug, Clone)]
pub struct RestResumeSearch {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ResumeChunk>,
}

impl RestResumeSearch {
    /// Build a client from config. Returns `None` when no base URL is
    /// configured (retrieval disabled).
    pub fn from_config(cfg: &RetrievalConfig) -> Result<Option<Self>> {
        let Some(base_url) = &cfg.base_url else {
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("building retrieval client: {e}")))?;

        Ok(Some(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: cfg.api_key.clone(),
        }))
    }
}

#[async_trait::async_trait]
impl ResumeSearch for RestResumeSearch {
    async fn search(&self, query: &str, top_k: usize, threshold: f64)
        -> Result<Vec<ResumeChunk>> {
        let url = format!("{}/api/search", self.base_url);
        let mut rb = self
            .http
            .post(&url)
            .header("X-Trace-Id", Uuid::new_v4().to_string())
            .json(&serde_json::json!({
                "query": query,
                "top_k": top_k,
                "threshold": threshold,
            }));
        if let Some(key) = &self.api_key {
            rb = rb.header("X-Api-Key", key);
        }

        let response = rb
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("retrieval: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "retrieval: {url} returned {status}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("retrieval: body: {e}")))?;

        tracing::debug!(
            query_len = query.len(),
            results = parsed.results.len(),
            "resume search complete"
        );

        Ok(parsed.results)
    }
}
