//! Error types for the RelayDesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all RelayDesk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- A pipeline stage failed; the remaining stages were not run ---
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: ProviderError,
    },

    // --- Pipeline construction ---
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    // --- User input ---
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    // --- Uploaded documents ---
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    // --- Agent registry ---
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The provider failure behind this error, if there is one.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Error::Provider(e) | Error::Stage { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("No API key configured: {0}")]
    InvalidCredential(String),

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request to agent '{agent}' timed out after {timeout_secs}s")]
    Timeout { agent: String, timeout_secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Whether the backend could not be reached or refused to serve the call.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_)
                | ProviderError::ApiError { .. }
                | ProviderError::RateLimited { .. }
                | ProviderError::AuthenticationFailed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("No trip has been planned in this session yet")]
    NoTripPlanned,
}

#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("Could not extract text from {format} document: {reason}")]
    Extraction { format: String, reason: String },

    #[error("File '{filename}' is not valid UTF-8 text")]
    InvalidEncoding { filename: String },

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Pipeline '{0}' has no stages")]
    Empty(String),

    #[error("Stage key '{0}' is used more than once")]
    DuplicateStage(String),

    #[error("Stage '{stage}' refers to unknown agent '{agent}'")]
    UnknownAgent { stage: String, agent: String },

    #[error("Stage '{stage}' depends on '{dependency}', which does not run before it")]
    UnresolvedDependency { stage: String, dependency: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Agent '{0}' is already registered")]
    DuplicateAgent(String),
}
