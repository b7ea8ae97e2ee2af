use thiserror::Error;

/// Top-level error type for the `coreops-api` crate.
///
/// Covers every failure mode across all four service clients: transport,
/// JSON decoding, and each service's own error envelope. Callers map these
/// into their own diagnostics; nothing in this crate retries or aborts.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Fleet ───────────────────────────────────────────────────────
    /// Error decoded from the Fleet `{error: {code, message}}` envelope.
    #[error("{code}: {message}")]
    Fleet { code: i64, message: String },

    /// A paginated fetch exceeded the configured page cap without the
    /// server ever returning an empty `nextPageToken`.
    #[error("pagination exceeded {pages} pages without terminating")]
    PaginationLimitExceeded { pages: usize },

    /// `UnitStatus::Unknown` was passed where the server expects a
    /// concrete desired state. Rejected before any request is sent.
    #[error("desired state must be launched, loaded, or inactive")]
    InvalidDesiredState,

    // ── etcd ────────────────────────────────────────────────────────
    /// Error decoded from the etcd `{errorCode, message, cause}` body.
    #[error("{code}: {message} ({cause})")]
    Etcd {
        code: i64,
        message: String,
        cause: String,
    },

    // ── Consul ──────────────────────────────────────────────────────
    /// Consul reported zero health checks for the requested service.
    #[error("consul returned 0 checks for service {service}")]
    NoHealthChecks { service: String },

    // ── Docker ──────────────────────────────────────────────────────
    /// Non-success status from the Docker engine API.
    #[error("docker engine returned {status}: {message}")]
    Docker { status: u16, message: String },
}

impl Error {
    /// Returns `true` if this error indicates the requested resource does
    /// not exist on the remote service.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Fleet { code, .. } => *code == 404,
            // etcd v2 error code 100 is "Key not found".
            Self::Etcd { code, .. } => *code == 100,
            Self::Docker { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a transient transport failure a caller
    /// might retry. The clients themselves never retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout() || e.is_connect())
    }
}
