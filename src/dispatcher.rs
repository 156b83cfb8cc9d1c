//! Dispatcher: resolve, validate, and execute a decision.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capability::{validate_arguments, Capability, CapabilityRegistry};
use crate::decision::Decision;
use crate::error::{DispatchError, ErrorKind};

/// Message returned when the model declined to call anything.
pub const NO_ACTION_MESSAGE: &str = "No valid function call found in response";

/// Definite outcome of one dispatch cycle.
///
/// Executed: `success`. No action: `!success` and no `error`. Failed:
/// `error` holds the kind and `output` the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub success: bool,
    pub output: String,
    pub error: Option<ErrorKind>,
    /// Capability that was selected, when the cycle got that far.
    pub capability: Option<String>,
}

impl DispatchResult {
    pub fn executed(capability: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            capability: Some(capability.into()),
        }
    }

    pub fn no_action() -> Self {
        Self {
            success: false,
            output: NO_ACTION_MESSAGE.to_string(),
            error: None,
            capability: None,
        }
    }

    pub fn failed(error: &DispatchError) -> Self {
        Self {
            success: false,
            output: error.to_string(),
            error: Some(error.kind()),
            capability: None,
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn is_no_action(&self) -> bool {
        !self.success && self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Executes decisions against a shared, read-only registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Resolve and validate without executing.
    ///
    /// Returns the capability only if the name is registered and the
    /// arguments satisfy its schema.
    pub fn validate(&self, decision: &Decision) -> Result<&Arc<dyn Capability>, DispatchError> {
        let capability = self.registry.resolve(&decision.capability_name)?;
        validate_arguments(&decision.arguments, capability.parameters())?;
        Ok(capability)
    }

    /// Validate then execute, surfacing failures as errors.
    ///
    /// Handler errors and panics both become `CapabilityExecution`.
    pub async fn execute(&self, decision: &Decision) -> Result<String, DispatchError> {
        let capability = self.validate(decision)?;
        self.invoke(capability, decision).await
    }

    /// Execute a capability already returned by [`Dispatcher::validate`] for
    /// `decision`, without resolving or validating again.
    pub async fn invoke(
        &self,
        capability: &Arc<dyn Capability>,
        decision: &Decision,
    ) -> Result<String, DispatchError> {
        debug!(capability = %decision.capability_name, "executing capability");
        run_contained(capability.as_ref(), decision).await
    }

    /// Validate then execute, always producing a result.
    pub async fn dispatch(&self, decision: &Decision) -> DispatchResult {
        match self.execute(decision).await {
            Ok(output) => {
                info!(capability = %decision.capability_name, "capability executed");
                DispatchResult::executed(&decision.capability_name, output)
            }
            Err(err) => {
                warn!(capability = %decision.capability_name, error = %err, "dispatch failed");
                DispatchResult::failed(&err).with_capability(&decision.capability_name)
            }
        }
    }
}

async fn run_contained(capability: &dyn Capability, decision: &Decision) -> Result<String, DispatchError> {
    let args = decision.arguments();
    let name = capability.name();
    match AssertUnwindSafe(capability.execute(&args)).catch_unwind().await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(DispatchError::CapabilityExecution { capability, message })) => {
            Err(DispatchError::CapabilityExecution { capability, message })
        }
        Ok(Err(other)) => Err(DispatchError::execution(name, other.to_string())),
        Err(panic) => Err(DispatchError::execution(name, panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("capability panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("capability panicked: {s}")
    } else {
        "capability panicked".to_string()
    }
}
