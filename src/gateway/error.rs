//! Gateway error taxonomy.
//!
//! Every tool failure ends up as one [`GatewayError`]; the MCP layer maps it
//! onto a protocol error through [`ErrorCode`].

use std::fmt;

use crate::gateway::SourceError;
use crate::utils::ValidationError;

/// Protocol-level classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The caller sent bad arguments
    InvalidParams,
    /// Everything else
    InternalError,
}

/// Why one upstream attempt failed, kept for the aggregated error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source_id: String,
    pub reason: String,
}

impl SourceFailure {
    pub fn new(source_id: impl Into<String>, error: &SourceError) -> Self {
        Self {
            source_id: source_id.into(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source_id, self.reason)
    }
}

fn describe_attempts(attempts: &[SourceFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing, empty or malformed tool arguments. Raised before any I/O.
    #[error("Invalid parameters: {0}")]
    Validation(String),

    /// Credentials were refused, or a fresh token was rejected again
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A single-upstream tool could not get an answer
    #[error("{source_id} is unavailable: {error}")]
    Upstream {
        source_id: String,
        #[source]
        error: SourceError,
    },

    /// Every source of a multi-source domain failed
    #[error("All {domain} sources are unavailable ({})", describe_attempts(.attempts))]
    AllSourcesUnavailable {
        domain: String,
        attempts: Vec<SourceFailure>,
    },

    /// Unexpected failure inside the gateway itself
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    pub fn upstream(source_id: impl Into<String>, error: impl Into<SourceError>) -> Self {
        GatewayError::Upstream {
            source_id: source_id.into(),
            error: error.into(),
        }
    }

    /// Protocol classification: only validation problems are the caller's fault
    pub fn code(&self) -> ErrorCode {
        match self {
            GatewayError::Validation(_) => ErrorCode::InvalidParams,
            _ => ErrorCode::InternalError,
        }
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        GatewayError::Validation(err.to_string())
    }
}

impl From<GatewayError> for pmcp::Error {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err.code() {
            ErrorCode::InvalidParams => pmcp::Error::invalid_params(message),
            ErrorCode::InternalError => pmcp::Error::internal(message),
        }
    }
}
