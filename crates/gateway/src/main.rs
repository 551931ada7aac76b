use std::process::ExitCode;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

use hf_domain::config::{Config, ConfigSeverity};
use hf_domain::error::Error;
use hf_gateway::api;
use hf_gateway::cli::{Cli, Command, ConfigCommand};
use hf_gateway::runtime::metrics::{MetricsRecorder, SlaTargets};
use hf_gateway::state::AppState;
use hf_retrieval::{NoopResumeSearch, RestResumeSearch, ResumeSearch};
use hf_scenario::{RoleProfileStore, ScenarioStore};
use hf_sessions::SessionStore;

/// Exit code for invalid configuration.
const EXIT_INVALID_CONFIG: u8 = 2;
/// Exit code for fatal storage errors.
const EXIT_FATAL_STORAGE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            init_tracing();
            let config = match hf_gateway::cli::load_config() {
                Ok((config, path)) => {
                    tracing::info!(path, "configuration loaded");
                    config
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to load configuration");
                    return ExitCode::from(EXIT_INVALID_CONFIG);
                }
            };
            match run_server(Arc::new(config)).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(Error::Config(_) | Error::InvalidInput(_)) => {
                    ExitCode::from(EXIT_INVALID_CONFIG)
                }
                Err(Error::Fatal(_)) => ExitCode::from(EXIT_FATAL_STORAGE),
                Err(_) => ExitCode::FAILURE,
            }
        }
        Some(Command::Config(ConfigCommand::Validate)) => match hf_gateway::cli::load_config() {
            Ok((config, path)) => {
                let issues = config.validate();
                for issue in &issues {
                    println!("{issue}");
                }
                let error_count = issues
                    .iter()
                    .filter(|i| i.severity == ConfigSeverity::Error)
                    .count();
                if error_count > 0 {
                    eprintln!("{path}: {error_count} error(s)");
                    ExitCode::from(EXIT_INVALID_CONFIG)
                } else {
                    println!("{path}: OK");
                    ExitCode::SUCCESS
                }
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::from(EXIT_INVALID_CONFIG)
            }
        },
        Some(Command::Config(ConfigCommand::Show)) => match hf_gateway::cli::load_config() {
            Ok((config, _)) => match toml::to_string_pretty(&config) {
                Ok(rendered) => {
                    println!("{rendered}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("rendering config: {e}");
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("{e}");
                ExitCode::from(EXIT_INVALID_CONFIG)
            }
        },
        Some(Command::Version) => {
            println!("hireflow {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
    }
}

/// Initialize structured JSON tracing (only for the `serve` command).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hf_gateway=debug")),
        )
        .json()
        .init();
}

/// Start the gateway server with the given configuration.
async fn run_server(config: Arc<Config>) -> Result<(), Error> {
    tracing::info!("HireFlow starting");

    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        return Err(Error::Config(format!(
            "config validation failed with {error_count} error(s)"
        )));
    }

    // ── Scenario store ───────────────────────────────────────────────
    let scenarios = Arc::new(ScenarioStore::open(&config.scenario.dir)?);
    tracing::info!(
        scenarios = scenarios.len(),
        dir = %config.scenario.dir.display(),
        "scenario store ready"
    );

    // ── Role profiles ────────────────────────────────────────────────
    let profiles = match &config.scenario.profiles_path {
        Some(path) => Arc::new(RoleProfileStore::load(path)?),
        None => {
            tracing::warn!("no role profile document configured, using built-in default");
            Arc::new(RoleProfileStore::empty())
        }
    };
    tracing::info!(profiles = profiles.len(), "role profile store ready");

    // ── LLM backend ──────────────────────────────────────────────────
    let llm = hf_providers::build_backend(&config.llm)?;

    // ── Resume retrieval ─────────────────────────────────────────────
    let retrieval: Arc<dyn ResumeSearch> = match RestResumeSearch::from_config(&config.retrieval)? {
        Some(client) => {
            tracing::info!(
                base_url = config.retrieval.base_url.as_deref().unwrap_or_default(),
                timeout_ms = config.retrieval.timeout_ms,
                "resume retrieval ready"
            );
            Arc::new(client)
        }
        None => {
            tracing::info!("resume retrieval not configured, turns run without cv_context");
            Arc::new(NoopResumeSearch)
        }
    };

    // ── Sessions ─────────────────────────────────────────────────────
    let sessions = Arc::new(SessionStore::new());
    tracing::info!("session store ready");

    // ── Metrics ──────────────────────────────────────────────────────
    let metrics = Arc::new(MetricsRecorder::new(SlaTargets {
        backchannel_ms: config.orchestrator.backchannel_sla_ms,
        turn_ms: config.orchestrator.turn_sla_ms,
    }));
    tracing::info!("metrics recorder ready");

    let state = AppState {
        config: config.clone(),
        scenarios,
        profiles,
        sessions: sessions.clone(),
        llm,
        retrieval,
        metrics,
    };

    // ── Idle session sweeper ─────────────────────────────────────────
    {
        let sessions = sessions.clone();
        let idle_timeout_s = config.sessions.idle_timeout_s;
        let sweep_interval_s = config.sessions.sweep_interval_s.max(1);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(
                sweep_interval_s,
            ));
            loop {
                interval.tick().await;
                let evicted = sessions.sweep_idle(idle_timeout_s).await;
                if !evicted.is_empty() {
                    tracing::info!(count = evicted.len(), "idle sessions evicted");
                }
            }
        });
    }
    tracing::info!(
        idle_timeout_s = config.sessions.idle_timeout_s,
        "idle session sweeper started"
    );

    // ── Router + layers ──────────────────────────────────────────────
    let cors_layer = build_cors_layer(&config.server.cors);
    let app = api::router()
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            config.server.max_concurrent_requests,
        ))
        .with_state(state);

    // ── Bind ─────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Config(format!("binding to {addr}: {e}")))?;

    tracing::info!(addr = %addr, "HireFlow listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::UpstreamUnavailable(format!("server error: {e}")))?;

    tracing::info!("HireFlow stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    } else {
        tracing::info!("shutdown signal received");
    }
}

/// Build a [`CorsLayer`] from the configured allowed origins.
///
/// Origins may carry a trailing `*` wildcard for the port segment
/// (e.g. `http://localhost:*`). A literal `"*"` allows all origins
/// (not recommended for production).
fn build_cors_layer(cors: &hf_domain::config::CorsConfig) -> CorsLayer {
    use axum::http::header;

    // allow_credentials is incompatible with wildcard origins.
    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\" — all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in &cors.allowed_origins {
        if origin.ends_with(":*") {
            wildcard_prefixes.push(origin.trim_end_matches('*').to_owned());
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            let origin_str = origin.to_str().unwrap_or("");
            // The remainder after the prefix must be digits only, so
            // "http://localhost:3000.evil.com" cannot slip through.
            wildcard_prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
