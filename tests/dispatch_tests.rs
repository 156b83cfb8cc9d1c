//! Tests for parsing and dispatching decisions (no backend involved).

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;

use tooldispatch::capability::{CapabilityRegistry, FnCapability, ParameterSchema};
use tooldispatch::decision::{parse_response, Decision, ParsedResponse};
use tooldispatch::dispatcher::{DispatchResult, Dispatcher, NO_ACTION_MESSAGE};
use tooldispatch::error::{DispatchError, ErrorKind};

use common::{counted_registry, weather_registry, SEOUL_WEATHER};

fn decision(name: &str, args: serde_json::Value) -> Decision {
    Decision::new(name, args.as_object().cloned().unwrap_or_default())
}

#[tokio::test]
async fn well_formed_response_executes_weather() {
    let dispatcher = Dispatcher::new(weather_registry());
    let parsed = parse_response(SEOUL_WEATHER).unwrap();

    let result = dispatcher.dispatch(parsed.decision().unwrap()).await;

    assert_eq!(
        result,
        DispatchResult {
            success: true,
            output: "현재 Seoul의 날씨는 맑음, 기온 20도입니다.".to_string(),
            error: None,
            capability: Some("get_weather".to_string()),
        }
    );
}

#[test]
fn prose_response_is_malformed() {
    let err = parse_response("I cannot help with that.").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    assert!(err.is_retryable());
}

#[test]
fn empty_tool_calls_is_no_decision() {
    assert_eq!(parse_response(r#"{"tool_calls":[]}"#).unwrap(), ParsedResponse::NoDecision);
}

#[tokio::test]
async fn unknown_capability_executes_nothing() {
    let counter = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new(counted_registry(Arc::clone(&counter)));

    let result = dispatcher
        .dispatch(&decision("get_stock_price", json!({"symbol": "AAPL"})))
        .await;

    assert!(!result.success);
    assert_eq!(result.error, Some(ErrorKind::UnknownCapability));
    assert!(result.output.contains("get_stock_price"));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_required_argument_names_parameter() {
    let dispatcher = Dispatcher::new(weather_registry());

    let err = dispatcher
        .execute(&decision("get_weather", json!({"unit": "celsius"})))
        .await
        .unwrap_err();

    match err {
        DispatchError::ArgumentValidation { parameter, .. } => assert_eq!(parameter, "location"),
        other => panic!("expected argument validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let registry = CapabilityRegistry::with_capabilities([Arc::new(FnCapability::from_sync(
        "get_weather",
        "Weather",
        ParameterSchema::object()
            .string("location", "City", true)
            .string_enum("unit", "Unit", &["celsius", "fahrenheit"], false)
            .build(),
        move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok("sunny".to_string())
        },
    )) as Arc<dyn tooldispatch::capability::Capability>])
    .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry));

    for args in [
        json!({}),
        json!({"location": null}),
        json!({"location": 12}),
        json!({"location": "Seoul", "unit": "kelvin"}),
    ] {
        let result = dispatcher.dispatch(&decision("get_weather", args)).await;
        assert_eq!(result.error, Some(ErrorKind::ArgumentValidation));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_error_becomes_execution_error() {
    let registry = CapabilityRegistry::with_capabilities([Arc::new(FnCapability::from_sync(
        "flaky",
        "Always fails",
        ParameterSchema::empty(),
        |_| Err(DispatchError::Io(std::io::Error::other("disk on fire"))),
    )) as Arc<dyn tooldispatch::capability::Capability>])
    .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let result = dispatcher.dispatch(&decision("flaky", json!({}))).await;

    assert_eq!(result.error, Some(ErrorKind::CapabilityExecution));
    assert!(result.output.contains("disk on fire"));
    assert_eq!(result.capability.as_deref(), Some("flaky"));
}

#[tokio::test]
async fn handler_panic_is_contained() {
    let registry = CapabilityRegistry::with_capabilities([Arc::new(FnCapability::from_sync(
        "explode",
        "Panics",
        ParameterSchema::empty(),
        |_| panic!("boom"),
    )) as Arc<dyn tooldispatch::capability::Capability>])
    .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let result = dispatcher.dispatch(&decision("explode", json!({}))).await;
    assert_eq!(result.error, Some(ErrorKind::CapabilityExecution));
    assert!(result.output.contains("boom"));

    // The dispatcher is still usable afterwards.
    let again = dispatcher.dispatch(&decision("explode", json!({}))).await;
    assert!(again.is_error());
}

#[tokio::test]
async fn first_of_multiple_calls_is_dispatched() {
    let counter = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::new(counted_registry(Arc::clone(&counter)));

    let parsed = parse_response(
        r#"{"tool_calls":[
            {"name":"get_calendar","arguments":{}},
            {"name":"ping","arguments":{}}
        ]}"#,
    )
    .unwrap();
    let ParsedResponse::Decision { decision, discarded_calls } = parsed else {
        panic!("expected decision");
    };

    let result = dispatcher.dispatch(&decision).await;
    assert_eq!(discarded_calls, 1);
    assert_eq!(result.output, "오늘의 일정: 회의 2건이 있습니다.");
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn no_action_result_is_distinct_from_errors() {
    let no_action = DispatchResult::no_action();
    assert!(no_action.is_no_action());
    assert!(!no_action.is_error());
    assert_eq!(no_action.output, NO_ACTION_MESSAGE);

    let failed = DispatchResult::failed(&DispatchError::MalformedResponse("prose".into()));
    assert!(!failed.is_no_action());
    assert!(failed.is_error());
}

#[test]
fn dispatch_result_serializes_error_kind_in_snake_case() {
    let failed = DispatchResult::failed(&DispatchError::UnknownCapability("x".into()));
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["error"], "unknown_capability");
    assert_eq!(json["success"], false);
}
