//! Defensive decoding of raw model text into a [`ParsedResponse`].
//!
//! The model's answer is untrusted input. The whole text must decode as one
//! JSON object of the shape
//!
//! ```json
//! {"tool_calls": [{"name": "get_weather", "arguments": {"location": "Seoul"}}]}
//! ```
//!
//! and every field is shape-checked before it is used. When several calls are
//! present only the first is kept; the rest are dropped and counted.

use serde_json::{Map, Value};
use tracing::warn;

use super::{Decision, ParsedResponse};
use crate::error::DispatchError;

/// Decode raw model output.
///
/// Returns [`ParsedResponse::NoDecision`] when `tool_calls` is absent, null,
/// or empty, and [`DispatchError::MalformedResponse`] for anything that is
/// not the expected shape (prose, non-object JSON, bad entries).
pub fn parse_response(raw: &str) -> Result<ParsedResponse, DispatchError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| DispatchError::MalformedResponse(format!("response is not valid JSON: {e}")))?;

    let Value::Object(mut root) = value else {
        return Err(DispatchError::MalformedResponse(
            "response must be a JSON object".to_string(),
        ));
    };

    let calls = match root.remove("tool_calls") {
        None | Some(Value::Null) => return Ok(ParsedResponse::NoDecision),
        Some(Value::Array(calls)) => calls,
        Some(_) => {
            return Err(DispatchError::MalformedResponse(
                "'tool_calls' must be an array".to_string(),
            ));
        }
    };

    let mut calls = calls.into_iter();
    let Some(first) = calls.next() else {
        return Ok(ParsedResponse::NoDecision);
    };
    let discarded_calls = calls.count();
    if discarded_calls > 0 {
        warn!(discarded_calls, "model returned multiple tool calls; only the first is dispatched");
    }

    let decision = parse_tool_call(first)?;
    Ok(ParsedResponse::Decision {
        decision,
        discarded_calls,
    })
}

fn parse_tool_call(call: Value) -> Result<Decision, DispatchError> {
    let Value::Object(mut call) = call else {
        return Err(DispatchError::MalformedResponse(
            "tool call entry must be an object".to_string(),
        ));
    };

    let name = match call.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        Some(Value::String(_)) => {
            return Err(DispatchError::MalformedResponse("tool call name is empty".to_string()));
        }
        _ => {
            return Err(DispatchError::MalformedResponse(
                "tool call is missing a string 'name'".to_string(),
            ));
        }
    };

    let arguments = parse_arguments(call.remove("arguments"))?;
    Ok(Decision::new(name, arguments))
}

fn parse_arguments(value: Option<Value>) -> Result<Map<String, Value>, DispatchError> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        // OpenAI-style wire encoding: the arguments object serialized as a string.
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(Map::new());
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => Ok(map),
                _ => Err(DispatchError::MalformedResponse(
                    "tool call 'arguments' string does not hold a JSON object".to_string(),
                )),
            }
        }
        Some(_) => Err(DispatchError::MalformedResponse(
            "tool call 'arguments' must be an object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decision_of(raw: &str) -> (Decision, usize) {
        match parse_response(raw).unwrap() {
            ParsedResponse::Decision {
                decision,
                discarded_calls,
            } => (decision, discarded_calls),
            ParsedResponse::NoDecision => panic!("expected a decision for {raw}"),
        }
    }

    fn assert_malformed(raw: &str) {
        match parse_response(raw) {
            Err(DispatchError::MalformedResponse(_)) => {}
            other => panic!("expected malformed response for {raw}, got {other:?}"),
        }
    }

    #[test]
    fn parses_single_call() {
        let (decision, discarded) = decision_of(
            r#"{"tool_calls":[{"name":"get_weather","arguments":{"location":"Seoul","unit":"celsius"}}]}"#,
        );
        assert_eq!(decision.capability_name, "get_weather");
        assert_eq!(decision.arguments["location"], "Seoul");
        assert_eq!(decision.arguments["unit"], "celsius");
        assert_eq!(discarded, 0);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let (decision, _) = decision_of("\n  {\"tool_calls\":[{\"name\":\"get_calendar\"}]}  \n");
        assert_eq!(decision.capability_name, "get_calendar");
        assert!(decision.arguments.is_empty());
    }

    #[test]
    fn prose_is_malformed() {
        assert_malformed("I cannot help with that.");
    }

    #[test]
    fn fenced_json_is_malformed() {
        assert_malformed("```json\n{\"tool_calls\":[]}\n```");
    }

    #[test]
    fn non_object_json_is_malformed() {
        assert_malformed("[1, 2, 3]");
        assert_malformed("\"tool_calls\"");
    }

    #[test]
    fn empty_or_absent_tool_calls_is_no_decision() {
        assert_eq!(parse_response(r#"{"tool_calls":[]}"#).unwrap(), ParsedResponse::NoDecision);
        assert_eq!(parse_response(r#"{"answer":"hi"}"#).unwrap(), ParsedResponse::NoDecision);
        assert_eq!(parse_response(r#"{"tool_calls":null}"#).unwrap(), ParsedResponse::NoDecision);
    }

    #[test]
    fn non_array_tool_calls_is_malformed() {
        assert_malformed(r#"{"tool_calls":{"name":"get_weather"}}"#);
    }

    #[test]
    fn first_call_wins_and_rest_are_counted() {
        let (decision, discarded) = decision_of(
            r#"{"tool_calls":[
                {"name":"get_calendar","arguments":{}},
                {"name":"get_weather","arguments":{"location":"Seoul"}},
                {"name":"get_weather","arguments":{"location":"Busan"}}
            ]}"#,
        );
        assert_eq!(decision.capability_name, "get_calendar");
        assert_eq!(discarded, 2);
    }

    #[test]
    fn later_malformed_calls_are_ignored() {
        let (decision, discarded) =
            decision_of(r#"{"tool_calls":[{"name":"get_calendar"}, 42, "junk"]}"#);
        assert_eq!(decision.capability_name, "get_calendar");
        assert_eq!(discarded, 2);
    }

    #[test]
    fn entry_without_string_name_is_malformed() {
        assert_malformed(r#"{"tool_calls":[{"arguments":{}}]}"#);
        assert_malformed(r#"{"tool_calls":[{"name":7}]}"#);
        assert_malformed(r#"{"tool_calls":[{"name":"  "}]}"#);
        assert_malformed(r#"{"tool_calls":["get_weather"]}"#);
    }

    #[test]
    fn string_encoded_arguments_are_decoded() {
        let (decision, _) = decision_of(
            r#"{"tool_calls":[{"name":"get_weather","arguments":"{\"location\":\"Seoul\"}"}]}"#,
        );
        assert_eq!(decision.arguments["location"], json!("Seoul"));
    }

    #[test]
    fn non_object_arguments_are_malformed() {
        assert_malformed(r#"{"tool_calls":[{"name":"get_weather","arguments":[1]}]}"#);
        assert_malformed(r#"{"tool_calls":[{"name":"get_weather","arguments":"not json"}]}"#);
    }

    #[test]
    fn argument_values_are_not_coerced() {
        let (decision, _) =
            decision_of(r#"{"tool_calls":[{"name":"get_weather","arguments":{"location":42}}]}"#);
        assert_eq!(decision.arguments["location"], json!(42));
    }
}
