mod backchannel;
mod llm;
mod orchestrator;
mod retrieval;
mod scenario;
mod server;
mod sessions;

pub use backchannel::*;
pub use llm::*;
pub use orchestrator::*;
pub use retrieval::*;
pub use scenario::*;
pub use server::*;
pub use sessions::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub backchannel: BackchannelConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Environment overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl Config {
    /// Apply the recognized environment overrides on top of the parsed
    /// file. Unparsable values are ignored with a warning — the file (or
    /// default) value stays in effect.
    pub fn apply_env_overrides(&mut self) {
        override_parse("SLA_BACKCHANNEL_MS", &mut self.orchestrator.backchannel_sla_ms);
        override_parse("SLA_TURN_MS", &mut self.orchestrator.turn_sla_ms);
        override_parse("SLA_SAFETY_MS", &mut self.orchestrator.safety_margin_ms);
        override_parse("LLM_MAX_TOKENS", &mut self.llm.max_tokens);
        override_parse("LLM_TEMPERATURE", &mut self.llm.temperature);
        override_parse("LLM_JSON_SCHEMA_ENFORCE", &mut self.llm.json_schema_enforce);
        override_parse(
            "BACKCHANNEL_MIN_INTERVAL_MS",
            &mut self.backchannel.min_interval_ms,
        );
        override_parse("SESSION_IDLE_TIMEOUT_S", &mut self.sessions.idle_timeout_s);
        override_parse("RETRIEVAL_TIMEOUT_MS", &mut self.retrieval.timeout_ms);
        override_parse("RETRIEVAL_TOP_K", &mut self.retrieval.top_k);
        if let Ok(dir) = std::env::var("SCENARIO_DIR") {
            if !dir.is_empty() {
                self.scenario.dir = dir.into();
            }
        }
    }
}

fn override_parse<T: std::str::FromStr>(var: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse::<T>() {
            Ok(v) => *slot = v,
            Err(_) => {
                tracing::warn!(var, value = %raw, "unparsable env override, ignoring");
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(err("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(err("server.host", "host must not be empty"));
        }

        // LLM backend URL must be a valid URL.
        if self.llm.base_url.is_empty() {
            errors.push(err("llm.base_url", "base_url must not be empty"));
        } else if !is_http_url(&self.llm.base_url) {
            errors.push(err(
                "llm.base_url",
                &format!(
                    "base_url must start with http:// or https:// (got \"{}\")",
                    self.llm.base_url
                ),
            ));
        }

        if let Some(url) = &self.retrieval.base_url {
            if !is_http_url(url) {
                errors.push(err(
                    "retrieval.base_url",
                    &format!("base_url must start with http:// or https:// (got \"{url}\")"),
                ));
            }
        }
        if self.retrieval.top_k == 0 {
            errors.push(err("retrieval.top_k", "top_k must be greater than 0"));
        }

        // The substantive path needs budget after the safety margin.
        if self.orchestrator.safety_margin_ms >= self.orchestrator.turn_sla_ms {
            errors.push(err(
                "orchestrator.safety_margin_ms",
                "safety margin must be smaller than the turn SLA",
            ));
        }
        if self.orchestrator.backchannel_sla_ms > self.orchestrator.turn_sla_ms {
            errors.push(warn(
                "orchestrator.backchannel_sla_ms",
                "backchannel SLA exceeds the turn SLA",
            ));
        }

        if self.llm.max_tokens == 0 {
            errors.push(err("llm.max_tokens", "max_tokens must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            errors.push(err(
                "llm.temperature",
                "temperature must be within [0.0, 2.0]",
            ));
        }

        // Backchannel tables must not be empty, and thresholds must be ordered.
        for (role, table) in std::iter::once(("default", &self.backchannel.default_table))
            .chain(
                self.backchannel
                    .roles
                    .iter()
                    .map(|(k, v)| (k.as_str(), v)),
            )
        {
            if table.generic_neutral.is_empty() {
                errors.push(err(
                    &format!("backchannel.{role}.generic_neutral"),
                    "neutral utterance list must not be empty",
                ));
            }
            if table.negative_threshold > table.positive_threshold {
                errors.push(err(
                    &format!("backchannel.{role}"),
                    "negative_threshold must not exceed positive_threshold",
                ));
            }
        }

        if self.sessions.idle_timeout_s == 0 {
            errors.push(err(
                "sessions.idle_timeout_s",
                "idle timeout must be greater than 0",
            ));
        }

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(warn(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        errors
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn err(field: &str, message: &str) -> ConfigError {
    ConfigError {
        severity: ConfigSeverity::Error,
        field: field.into(),
        message: message.into(),
    }
}

fn warn(field: &str, message: &str) -> ConfigError {
    ConfigError {
        severity: ConfigSeverity::Warning,
        field: field.into(),
        message: message.into(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn find_issue<'a>(issues: &'a [ConfigError], field_prefix: &str) -> Option<&'a ConfigError> {
        issues.iter().find(|e| e.field.starts_with(field_prefix))
    }

    #[test]
    fn default_config_passes() {
        let issues = Config::default().validate();
        let errors: Vec<_> = issues
            .iter()
            .filter(|e| e.severity == ConfigSeverity::Error)
            .collect();
        assert!(errors.is_empty(), "expected no errors, got: {errors:?}");
    }

    #[test]
    fn server_port_zero_is_error() {
        let mut cfg = Config::default();
        cfg.server.port = 0;
        let issues = cfg.validate();
        let issue = find_issue(&issues, "server.port").expect("expected server.port error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn llm_base_url_invalid_scheme_is_error() {
        let mut cfg = Config::default();
        cfg.llm.base_url = "ftp://localhost:8080".into();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "llm.base_url").expect("expected llm.base_url error");
        assert!(issue.message.contains("http://"));
    }

    #[test]
    fn safety_margin_exceeding_turn_sla_is_error() {
        let mut cfg = Config::default();
        cfg.orchestrator.turn_sla_ms = 200;
        cfg.orchestrator.safety_margin_ms = 300;
        let issues = cfg.validate();
        let issue = find_issue(&issues, "orchestrator.safety_margin_ms")
            .expect("expected safety margin error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn empty_neutral_table_is_error() {
        let mut cfg = Config::default();
        cfg.backchannel.default_table.generic_neutral.clear();
        let issues = cfg.validate();
        assert!(find_issue(&issues, "backchannel.default.generic_neutral").is_some());
    }

    #[test]
    fn inverted_tone_thresholds_is_error() {
        let mut cfg = Config::default();
        cfg.backchannel.default_table.negative_threshold = 0.9;
        let issues = cfg.validate();
        let issue =
            find_issue(&issues, "backchannel.default").expect("expected threshold error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn cors_wildcard_is_warning() {
        let mut cfg = Config::default();
        cfg.server.cors.allowed_origins = vec!["*".into()];
        let issues = cfg.validate();
        let issue = find_issue(&issues, "server.cors.allowed_origins")
            .expect("expected CORS wildcard warning");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn llm_budget_subtracts_safety_margin() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.llm_budget_ms(), 4700);
    }

    #[test]
    fn toml_round_trip_with_partial_file() {
        let cfg: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [llm]
            backend = "openai_compat"
            base_url = "https://api.openai.com/v1"
            model = "gpt-4o-mini"

            [backchannel]
            min_interval_ms = 1500
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.llm.backend, BackendKind::OpenaiCompat);
        assert_eq!(cfg.llm.max_tokens, 96);
        assert_eq!(cfg.backchannel.min_interval_ms, 1500);
        assert_eq!(cfg.orchestrator.turn_sla_ms, 5000);
    }
}
