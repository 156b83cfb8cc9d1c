//! OpenAI-compatible Chat Completions backend (LiteLLM proxies, Ollama `/v1`, vLLM).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::DispatchConfig;
use crate::error::DispatchError;

use super::http::{json_headers, shared_client, status_to_error};
use super::{Backend, BackendRequest};

const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

pub struct OpenAiCompatibleBackend {
    model: String,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiCompatibleBackend {
    pub fn new(model: impl Into<String>, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Local Ollama server on its default port.
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::new(model, OLLAMA_BASE_URL, None)
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.model.clone(), config.base_url.clone(), config.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request_body(&self, request: &BackendRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.instruction },
            ],
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(temp) = request.settings.temperature {
                obj.insert("temperature".into(), temp.into());
            }
            if let Some(max) = request.settings.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
        }

        body
    }
}

#[async_trait]
impl Backend for OpenAiCompatibleBackend {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &BackendRequest) -> Result<String, DispatchError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, url = %url, "chat completion request");

        let resp = shared_client()
            .post(&url)
            .headers(json_headers(self.api_key.as_deref()))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body_text));
        }

        let data: ChatResponse = resp.json().await.map_err(|e| {
            DispatchError::BackendUnavailable(format!("unreadable completion envelope: {e}"))
        })?;
        let choice = data.choices.into_iter().next().ok_or_else(|| {
            DispatchError::BackendUnavailable("no choices in completion response".to_string())
        })?;

        choice.message.into_contract_text()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    tool_calls: Option<Vec<NativeToolCall>>,
}

/// Tool call returned through the server's native function-calling channel.
#[derive(Debug, Deserialize)]
struct NativeToolCall {
    function: NativeFunction,
}

#[derive(Debug, Deserialize)]
struct NativeFunction {
    name: String,
    /// Usually a JSON object encoded as a string; left for the decision parser.
    #[serde(default)]
    arguments: serde_json::Value,
}

impl ChatMessage {
    /// Text handed to the decision parser.
    ///
    /// Prefers the text content. When the server answered through native
    /// `tool_calls` instead, they are rewritten into the same
    /// `{"tool_calls": [...]}` contract the prompt asks for.
    fn into_contract_text(self) -> Result<String, DispatchError> {
        if let Some(content) = self.content.filter(|c| !c.trim().is_empty()) {
            return Ok(content);
        }
        let tool_calls = self.tool_calls.unwrap_or_default();
        if tool_calls.is_empty() {
            return Err(DispatchError::BackendUnavailable(
                "completion has no text content".to_string(),
            ));
        }

        let calls: Vec<serde_json::Value> = tool_calls
            .into_iter()
            .map(|call| {
                serde_json::json!({
                    "name": call.function.name,
                    "arguments": call.function.arguments,
                })
            })
            .collect();
        debug!(calls = calls.len(), "using native tool calls from completion");
        Ok(serde_json::json!({ "tool_calls": calls }).to_string())
    }
}
