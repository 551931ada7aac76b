/// Shared error type used across all HireFlow crates.
///
/// The variants mirror the API-level error kinds: the gateway maps
/// `InvalidInput`/`NotFound`/`Conflict` to 4xx responses, while
/// `DeadlineExceeded` and `UpstreamUnavailable` are always recovered
/// inside a turn (heuristic fallback) and never surface to callers.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The turn was superseded by a newer one. Silent by design.
    #[error("cancelled")]
    Cancelled,

    /// Storage corruption. The process exits with code 3.
    #[error("fatal storage error: {0}")]
    Fatal(String),

    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// True for errors a turn recovers from locally via the heuristic path.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DeadlineExceeded(_) | Error::UpstreamUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
