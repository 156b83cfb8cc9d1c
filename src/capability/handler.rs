//! Capability trait and closure-based capability wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::CapabilityArguments;
use super::schema::ParameterSchema;
use crate::error::DispatchError;

/// A function the model may select. Implement this to expose it through a registry.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Capability name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// Declared parameters.
    fn parameters(&self) -> &ParameterSchema;

    /// Execute with arguments that already passed schema validation.
    async fn execute(&self, args: &CapabilityArguments) -> Result<String, DispatchError>;
}

type Handler = dyn Fn(CapabilityArguments) -> Pin<Box<dyn Future<Output = Result<String, DispatchError>> + Send>>
    + Send
    + Sync;

/// Closure-based capability for quick registration.
pub struct FnCapability {
    name: String,
    description: String,
    parameters: ParameterSchema,
    handler: Arc<Handler>,
}

impl FnCapability {
    /// Create a capability from an async closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(CapabilityArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, DispatchError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    /// Create a capability from a synchronous closure.
    pub fn from_sync<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(&CapabilityArguments) -> Result<String, DispatchError> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        Self::new(name, description, parameters, move |args| {
            let handler = Arc::clone(&handler);
            async move { handler(&args) }
        })
    }
}

#[async_trait]
impl Capability for FnCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }

    async fn execute(&self, args: &CapabilityArguments) -> Result<String, DispatchError> {
        (self.handler)(args.clone()).await
    }
}

impl std::fmt::Debug for FnCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCapability")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
