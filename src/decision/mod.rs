//! Model decisions: what the model asked to call, decoded from its raw text.

pub mod parser;

pub use parser::parse_response;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::capability::CapabilityArguments;

/// Parsed intent to invoke one capability.
///
/// Arguments are kept verbatim from the model output; they are only
/// trusted after the dispatcher has validated them against the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub capability_name: String,
    pub arguments: Map<String, Value>,
}

impl Decision {
    pub fn new(capability_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            capability_name: capability_name.into(),
            arguments,
        }
    }

    pub fn arguments(&self) -> CapabilityArguments {
        CapabilityArguments::new(self.arguments.clone())
    }
}

/// Outcome of decoding a well-formed model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// The first tool call. `discarded_calls` counts the ones that followed it.
    Decision {
        decision: Decision,
        discarded_calls: usize,
    },
    /// The model declined to call anything.
    NoDecision,
}

impl ParsedResponse {
    pub fn decision(&self) -> Option<&Decision> {
        match self {
            Self::Decision { decision, .. } => Some(decision),
            Self::NoDecision => None,
        }
    }

    pub fn into_decision(self) -> Option<Decision> {
        match self {
            Self::Decision { decision, .. } => Some(decision),
            Self::NoDecision => None,
        }
    }
}
