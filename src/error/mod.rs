//! Error types for tooldispatch.

pub mod kind;

pub use kind::ErrorKind;

use thiserror::Error;

/// Primary error type for registry, backend, parsing, and dispatch operations.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Capability already registered: {0}")]
    DuplicateCapability(String),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Invalid argument '{parameter}': {reason}")]
    ArgumentValidation { parameter: String, reason: String },

    #[error("Capability execution error: {capability}: {message}")]
    CapabilityExecution { capability: String, message: String },

    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),

    #[error("Dispatch cycle cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// Create an argument validation error naming the offending parameter.
    pub fn argument(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArgumentValidation {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a capability execution error carrying the handler's message.
    pub fn execution(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CapabilityExecution {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateCapability(_) => ErrorKind::DuplicateCapability,
            Self::UnknownCapability(_) => ErrorKind::UnknownCapability,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::ArgumentValidation { .. } => ErrorKind::ArgumentValidation,
            Self::CapabilityExecution { .. } => ErrorKind::CapabilityExecution,
            Self::InvalidInstruction(_) => ErrorKind::InvalidInstruction,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether re-running the cycle is potentially useful.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Whether this is a startup error rather than a per-cycle one.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DispatchError>;
