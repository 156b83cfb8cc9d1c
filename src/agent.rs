//! Tool-calling agent: one dispatch cycle per instruction.
//!
//! The agent composes a [`DecisionRequester`] and a [`Dispatcher`] over a
//! shared registry. A conversational loop that wants tool calling holds an
//! agent and calls [`ToolCallingAgent::run`] for each turn; the agent itself
//! keeps no conversation state.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tooldispatch::prelude::*;
//!
//! # async fn example() -> tooldispatch::error::Result<()> {
//! let config = DispatchConfig::load(None)?;
//! let registry = Arc::new(CapabilityRegistry::with_capabilities(
//!     tooldispatch::capability::builtin::all_capabilities(&config)?,
//! )?);
//! let agent = ToolCallingAgent::from_config(&config, registry);
//!
//! let result = agent.run("What's the weather like in Seoul in celsius?").await;
//! println!("{}", result.output);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::backend::{Backend, OpenAiCompatibleBackend};
use crate::capability::CapabilityRegistry;
use crate::config::DispatchConfig;
use crate::decision::{parse_response, ParsedResponse};
use crate::dispatcher::{DispatchResult, Dispatcher};
use crate::error::{DispatchError, ErrorKind};
use crate::requester::{DecisionRequest, DecisionRequester};

/// Phase of a dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    Requesting,
    Parsing,
    Validating,
    Executing,
    Done,
    NoAction,
    Failed(ErrorKind),
}

impl CycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::NoAction | Self::Failed(_))
    }
}

/// Result of a cycle together with its id and the phase it ended in.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle_id: uuid::Uuid,
    pub state: CycleState,
    pub result: DispatchResult,
}

/// Plain dispatch object used by, not derived from, a conversational loop.
#[derive(Debug, Clone)]
pub struct ToolCallingAgent {
    requester: DecisionRequester,
    dispatcher: Dispatcher,
}

impl ToolCallingAgent {
    pub fn new(requester: DecisionRequester, registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            requester,
            dispatcher: Dispatcher::new(registry),
        }
    }

    /// Agent over an explicit backend using the config's timeout and sampling settings.
    pub fn with_backend(
        backend: Arc<dyn Backend>,
        config: &DispatchConfig,
        registry: Arc<CapabilityRegistry>,
    ) -> Self {
        let requester =
            DecisionRequester::new(backend, config.timeout).with_settings(config.backend_settings());
        Self::new(requester, registry)
    }

    /// Agent over the OpenAI-compatible HTTP backend described by `config`.
    pub fn from_config(config: &DispatchConfig, registry: Arc<CapabilityRegistry>) -> Self {
        let backend: Arc<dyn Backend> = Arc::new(OpenAiCompatibleBackend::from_config(config));
        Self::with_backend(backend, config, registry)
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        self.dispatcher.registry()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one cycle to completion.
    pub async fn run(&self, instruction: &str) -> DispatchResult {
        self.run_with_cancel(instruction, &CancellationToken::new())
            .await
            .result
    }

    /// Run one cycle that `cancel` may abort while the backend call is pending.
    ///
    /// A cancelled cycle never parses, validates, or executes anything.
    pub async fn run_with_cancel(&self, instruction: &str, cancel: &CancellationToken) -> CycleReport {
        let cycle_id = uuid::Uuid::new_v4();
        let span = info_span!("dispatch_cycle", %cycle_id);
        self.cycle(cycle_id, instruction, cancel).instrument(span).await
    }

    /// Parse and dispatch already-obtained model text (no backend call).
    pub async fn run_parsed(&self, raw: &str) -> DispatchResult {
        let cycle_id = uuid::Uuid::new_v4();
        let span = info_span!("dispatch_cycle", %cycle_id);
        async {
            let mut cycle = Cycle::new(cycle_id);
            cycle.advance(CycleState::Parsing);
            self.finish_from_text(cycle, raw).await.result
        }
        .instrument(span)
        .await
    }

    async fn cycle(&self, cycle_id: uuid::Uuid, instruction: &str, cancel: &CancellationToken) -> CycleReport {
        let mut cycle = Cycle::new(cycle_id);

        cycle.advance(CycleState::Requesting);
        let request = DecisionRequest {
            instruction,
            available_capabilities: self.dispatcher.registry(),
        };
        let raw = match self.requester.request(request, cancel).await {
            Ok(raw) => raw,
            Err(err) => return cycle.fail(&err, None),
        };

        cycle.advance(CycleState::Parsing);
        self.finish_from_text(cycle, &raw).await
    }

    async fn finish_from_text(&self, mut cycle: Cycle, raw: &str) -> CycleReport {
        let decision = match parse_response(raw) {
            Ok(ParsedResponse::Decision { decision, .. }) => decision,
            Ok(ParsedResponse::NoDecision) => {
                cycle.advance(CycleState::NoAction);
                return cycle.finish(DispatchResult::no_action());
            }
            Err(err) => {
                debug!(raw = %raw, "unparseable model output");
                return cycle.fail(&err, None);
            }
        };
        let name = decision.capability_name.as_str();

        cycle.advance(CycleState::Validating);
        let capability = match self.dispatcher.validate(&decision) {
            Ok(capability) => capability,
            Err(err) => return cycle.fail(&err, Some(name)),
        };

        cycle.advance(CycleState::Executing);
        match self.dispatcher.invoke(capability, &decision).await {
            Ok(output) => {
                cycle.advance(CycleState::Done);
                cycle.finish(DispatchResult::executed(name, output))
            }
            Err(err) => cycle.fail(&err, Some(name)),
        }
    }
}

struct Cycle {
    id: uuid::Uuid,
    state: CycleState,
}

impl Cycle {
    fn new(id: uuid::Uuid) -> Self {
        Self {
            id,
            state: CycleState::Idle,
        }
    }

    fn advance(&mut self, next: CycleState) {
        debug!(from = ?self.state, to = ?next, "cycle transition");
        self.state = next;
    }

    fn fail(mut self, err: &DispatchError, capability: Option<&str>) -> CycleReport {
        warn!(phase = ?self.state, error = %err, "dispatch cycle failed");
        self.advance(CycleState::Failed(err.kind()));
        let mut result = DispatchResult::failed(err);
        if let Some(name) = capability {
            result = result.with_capability(name);
        }
        self.finish(result)
    }

    fn finish(self, result: DispatchResult) -> CycleReport {
        CycleReport {
            cycle_id: self.id,
            state: self.state,
            result,
        }
    }
}
