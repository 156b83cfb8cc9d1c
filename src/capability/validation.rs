//! Validate decision arguments against a capability's parameter schema.

use serde_json::{Map, Value};

use super::schema::ParameterSchema;
use crate::error::DispatchError;

/// Validate arguments against a parameter schema.
///
/// Checks, in declaration order, that every required parameter is present
/// and non-null, then that every supplied declared parameter has the right
/// type and (for enums) an allowed value. Undeclared extra arguments pass
/// through untouched. The first violation is returned as
/// [`DispatchError::ArgumentValidation`] naming the parameter.
pub fn validate_arguments(args: &Map<String, Value>, schema: &ParameterSchema) -> Result<(), DispatchError> {
    for spec in schema.required() {
        match args.get(&spec.name) {
            None | Some(Value::Null) => {
                return Err(DispatchError::argument(&spec.name, "missing required parameter"));
            }
            Some(_) => {}
        }
    }

    for spec in schema.params() {
        let Some(value) = args.get(&spec.name) else {
            continue;
        };
        // Optional parameters may be sent explicitly as null.
        if value.is_null() && !spec.required {
            continue;
        }
        if !spec.param_type.matches(value) {
            return Err(DispatchError::argument(
                &spec.name,
                format!("expected type '{}', got {}", spec.param_type, json_type_name(value)),
            ));
        }
        if let (Some(allowed), Some(s)) = (&spec.allowed_values, value.as_str()) {
            if !allowed.iter().any(|a| a == s) {
                return Err(DispatchError::argument(
                    &spec.name,
                    format!("value '{s}' is not one of [{}]", allowed.join(", ")),
                ));
            }
        }
    }

    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
