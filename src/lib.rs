//! tooldispatch: tool-calling dispatch for language-model agents.
//!
//! Declare a fixed set of capabilities, present them to a model as a
//! constrained choice, decode its answer defensively, and execute the one
//! capability it picked with validated arguments. Every instruction ends in
//! a definite [`dispatcher::DispatchResult`]: executed, no action, or a
//! typed failure.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tooldispatch::prelude::*;
//!
//! # async fn example() -> tooldispatch::error::Result<()> {
//! let mut registry = CapabilityRegistry::new();
//! registry.register(Arc::new(FnCapability::from_sync(
//!     "get_calendar",
//!     "Get today's calendar events",
//!     ParameterSchema::empty(),
//!     |_args| Ok("No meetings today.".to_string()),
//! )))?;
//!
//! let config = DispatchConfig::from_env()?;
//! let agent = ToolCallingAgent::from_config(&config, Arc::new(registry));
//! let result = agent.run("What's on my calendar?").await;
//! println!("{}", result.output);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod backend;
pub mod capability;
pub mod config;
pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod prelude;
pub mod prompt;
pub mod requester;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
