//! Convenience re-exports for common use.

pub use crate::agent::{CycleReport, CycleState, ToolCallingAgent};
pub use crate::backend::{Backend, BackendRequest, BackendSettings, OpenAiCompatibleBackend};
pub use crate::capability::{
    Capability, CapabilityArguments, CapabilityRegistry, FnCapability, ParamType, ParameterSchema,
};
pub use crate::config::DispatchConfig;
pub use crate::decision::{parse_response, Decision, ParsedResponse};
pub use crate::dispatcher::{DispatchResult, Dispatcher};
pub use crate::error::{DispatchError, ErrorKind, Result};
pub use crate::requester::DecisionRequester;
