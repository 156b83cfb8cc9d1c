//! Shared test helpers: scripted backend and counting capabilities.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tooldispatch::backend::{Backend, BackendRequest};
use tooldispatch::capability::builtin::{calendar_capability, weather_capability};
use tooldispatch::capability::{Capability, CapabilityRegistry, FnCapability, ParameterSchema};
use tooldispatch::error::DispatchError;

/// A backend that replays canned responses and records requests.
pub struct MockBackend {
    responses: Mutex<VecDeque<Result<String, DispatchError>>>,
    requests: Mutex<Vec<BackendRequest>>,
    delay: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a raw text response.
    pub fn queue_text(&self, text: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    /// Queue a backend failure.
    pub fn queue_error(&self, err: DispatchError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<BackendRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &BackendRequest) -> Result<String, DispatchError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"tool_calls": []}"#.to_string()))
    }
}

/// Capability that counts invocations and echoes its arguments.
pub fn counting_capability(name: &str, counter: Arc<AtomicUsize>) -> Arc<dyn Capability> {
    Arc::new(FnCapability::from_sync(
        name,
        "Counts calls",
        ParameterSchema::object().string("note", "Free text", false).build(),
        move |args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("called with {}", serde_json::Value::Object(args.raw().clone())))
        },
    ))
}

/// Registry holding the reference weather and calendar capabilities.
pub fn weather_registry() -> Arc<CapabilityRegistry> {
    Arc::new(CapabilityRegistry::with_capabilities([weather_capability(), calendar_capability()]).unwrap())
}

/// Weather + calendar registry plus a counting `ping` capability.
pub fn counted_registry(counter: Arc<AtomicUsize>) -> Arc<CapabilityRegistry> {
    Arc::new(
        CapabilityRegistry::with_capabilities([
            weather_capability(),
            calendar_capability(),
            counting_capability("ping", counter),
        ])
        .unwrap(),
    )
}

pub const SEOUL_WEATHER: &str =
    r#"{"tool_calls":[{"name":"get_weather","arguments":{"location":"Seoul","unit":"celsius"}}]}"#;
