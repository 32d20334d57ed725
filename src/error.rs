use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Herald.
///
/// Subsystems with typed failure modes define their own variant. Heartbeat
/// glue keeps using `anyhow::Result` for context chains; these types exist so
/// callers can tell a rejected platform call from a missing script.
#[derive(Debug, Error)]
pub enum HeraldError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Oracle (LLM) ────────────────────────────────────────────────────
    #[error("oracle: {0}")]
    Oracle(#[from] OracleError),

    // ── Platform / Channel ──────────────────────────────────────────────
    #[error("platform: {0}")]
    Platform(#[from] PlatformError),

    // ── Persisted state ─────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Subprocess tools ────────────────────────────────────────────────
    #[error("tool: {0}")]
    Tool(#[from] ToolError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no enabled platform configured in {0}")]
    NoPlatform(String),
}

// ─── Oracle errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("{provider} API key not set")]
    MissingApiKey { provider: String },

    #[error("{provider} API error ({status}): {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} returned no content")]
    EmptyReply { provider: String },
}

// ─── Storage errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed reading {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed decoding {path}: {message}")]
    Decode { path: String, message: String },
}

// ─── Platform errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{platform} request failed: {message}")]
    Request { platform: String, message: String },

    #[error("{platform} returned status {status}: {message}")]
    Status {
        platform: String,
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("{platform} response decode failed: {message}")]
    Decode { platform: String, message: String },

    #[error("{platform} rejected the request: {message}")]
    Rejected { platform: String, message: String },

    #[error("{platform} rejected verification: {message}")]
    Verification { platform: String, message: String },
}

impl PlatformError {
    /// HTTP status code, when the platform answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Status {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

// ─── Tool errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool {name} not configured")]
    NotFound { name: String },

    #[error("tool {name} failed to start: {message}")]
    Spawn { name: String, message: String },

    #[error("tool {name} timed out after {secs}s")]
    Timeout { name: String, secs: u64 },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, HeraldError>;
