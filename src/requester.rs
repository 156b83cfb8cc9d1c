//! Decision requester: one bounded, cancellable backend call per cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backend::{Backend, BackendRequest, BackendSettings};
use crate::capability::CapabilityRegistry;
use crate::error::DispatchError;
use crate::prompt::build_system_prompt;
use crate::util::timeout::with_timeout;

/// Ephemeral input of one request: the instruction and the registry it is
/// presented against.
#[derive(Debug, Clone, Copy)]
pub struct DecisionRequest<'a> {
    pub instruction: &'a str,
    pub available_capabilities: &'a CapabilityRegistry,
}

/// Turns an instruction plus the registry into one backend call.
///
/// No retries and no caching: repeated calls for the same instruction may
/// return different text.
#[derive(Clone)]
pub struct DecisionRequester {
    backend: Arc<dyn Backend>,
    timeout: Duration,
    settings: BackendSettings,
}

impl DecisionRequester {
    pub fn new(backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            settings: BackendSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: BackendSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Request the model's raw decision text.
    ///
    /// Fails with `InvalidInstruction` for blank input, `BackendUnavailable`
    /// when the backend errors or exceeds the timeout, and `Cancelled` when
    /// `cancel` fires first. The pending backend future is dropped in both
    /// of the latter cases.
    pub async fn request(
        &self,
        request: DecisionRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, DispatchError> {
        let instruction = request.instruction.trim();
        if instruction.is_empty() {
            return Err(DispatchError::InvalidInstruction(
                "instruction must not be empty".to_string(),
            ));
        }

        let backend_request = BackendRequest {
            system: build_system_prompt(request.available_capabilities),
            instruction: instruction.to_string(),
            settings: self.settings.clone(),
        };

        debug!(
            backend = self.backend.name(),
            model = self.backend.model_id(),
            capabilities = request.available_capabilities.len(),
            "requesting decision"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DispatchError::Cancelled),
            result = with_timeout(self.timeout, self.backend.complete(&backend_request)) => result,
        }
    }
}

impl std::fmt::Debug for DecisionRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionRequester")
            .field("backend", &self.backend.name())
            .field("model", &self.backend.model_id())
            .field("timeout", &self.timeout)
            .finish()
    }
}
