//! Machine-readable error classification carried on dispatch results.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of failure that ended a dispatch cycle (or a registry operation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    DuplicateCapability,
    UnknownCapability,
    BackendUnavailable,
    MalformedResponse,
    ArgumentValidation,
    CapabilityExecution,
    InvalidInstruction,
    Cancelled,
    Configuration,
    Io,
}

impl ErrorKind {
    /// Whether re-running the whole cycle may produce a different outcome.
    ///
    /// Model output is non-deterministic, so a malformed answer is worth
    /// another attempt; a bad registry or schema mismatch is not.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::BackendUnavailable | Self::MalformedResponse)
    }

    /// Startup errors that should abort the host instead of being reported per cycle.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::DuplicateCapability | Self::Configuration)
    }
}
