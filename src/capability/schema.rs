//! Parameter schemas: ordered parameter specs and their JSON Schema rendering.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// JSON type tag a parameter value must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// Check whether a JSON value has this type.
    pub fn matches(self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_u64() || whole_number(value).is_some(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Integer value of `value`, also accepting floats with no fractional part
/// (`3.0`), which models often emit for integer parameters.
pub(crate) fn whole_number(value: &serde_json::Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(f))
            .map(|f| f as i64)
    })
}

/// One declared parameter of a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    /// Closed set of accepted values (string parameters only).
    pub allowed_values: Option<Vec<String>>,
}

/// Ordered list of parameter specs for one capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    params: Vec<ParameterSpec>,
}

impl ParameterSchema {
    /// A schema with no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder: create an object schema with properties.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder { params: Vec::new() }
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.params.iter().filter(|p| p.required)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render as a JSON Schema object (`type`, `properties`, `required`).
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.params {
            let mut prop = serde_json::json!({
                "type": param.param_type.to_string(),
                "description": param.description,
            });
            if let Some(values) = &param.allowed_values {
                prop["enum"] = serde_json::json!(values);
            }
            properties.insert(param.name.clone(), prop);
        }
        let required: Vec<&str> = self.required().map(|p| p.name.as_str()).collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Builder for constructing parameter schemas.
pub struct ParameterBuilder {
    params: Vec<ParameterSpec>,
}

impl ParameterBuilder {
    fn push(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
        required: bool,
        allowed_values: Option<Vec<String>>,
    ) -> Self {
        let name = name.into();
        // Redeclaring a name replaces the earlier spec in place.
        let spec = ParameterSpec {
            name: name.clone(),
            param_type,
            description: description.into(),
            required,
            allowed_values,
        };
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = spec,
            None => self.params.push(spec),
        }
        self
    }

    /// Add a string property.
    pub fn string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamType::String, description, required, None)
    }

    /// Add a number property.
    pub fn number(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamType::Number, description, required, None)
    }

    /// Add an integer property.
    pub fn integer(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamType::Integer, description, required, None)
    }

    /// Add a boolean property.
    pub fn boolean(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamType::Boolean, description, required, None)
    }

    /// Add an object property.
    pub fn object(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamType::Object, description, required, None)
    }

    /// Add an array property.
    pub fn array(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamType::Array, description, required, None)
    }

    /// Add an enum (string) property.
    pub fn string_enum(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
        required: bool,
    ) -> Self {
        let values = values.iter().map(|v| v.to_string()).collect();
        self.push(name, ParamType::String, description, required, Some(values))
    }

    /// Build into a ParameterSchema.
    pub fn build(self) -> ParameterSchema {
        ParameterSchema { params: self.params }
    }
}
