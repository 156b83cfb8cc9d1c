//! Capability system: declared functions the model may select.

pub mod arguments;
pub mod builtin;
pub mod handler;
pub mod registry;
pub mod schema;
pub mod validation;

pub use arguments::CapabilityArguments;
pub use handler::{Capability, FnCapability};
pub use registry::{CapabilityDescriptor, CapabilityRegistry};
pub use schema::{ParamType, ParameterSchema, ParameterSpec};
pub use validation::validate_arguments;
