//! Typed access to capability call arguments.

use serde_json::{Map, Value};

use super::schema::whole_number;
use crate::error::DispatchError;

/// Keyword arguments handed to a capability, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityArguments {
    values: Map<String, Value>,
}

impl CapabilityArguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Get the raw argument map.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, DispatchError> {
        self.values
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| DispatchError::argument(key, "missing string argument"))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Get an integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64, DispatchError> {
        self.values
            .get(key)
            .and_then(whole_number)
            .ok_or_else(|| DispatchError::argument(key, "missing integer argument"))
    }

    /// Get a float argument.
    pub fn get_f64(&self, key: &str) -> Result<f64, DispatchError> {
        self.values
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| DispatchError::argument(key, "missing number argument"))
    }

    /// Get a boolean argument.
    pub fn get_bool(&self, key: &str) -> Result<bool, DispatchError> {
        self.values
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| DispatchError::argument(key, "missing boolean argument"))
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, DispatchError> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
            DispatchError::argument("*", format!("failed to deserialize arguments: {e}"))
        })
    }
}

impl From<Map<String, Value>> for CapabilityArguments {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}
