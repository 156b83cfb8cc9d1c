//! Language-model backend contract and the built-in HTTP implementation.

pub mod http;
pub mod openai_compatible;

pub use openai_compatible::OpenAiCompatibleBackend;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Sampling settings forwarded to the backend.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
pub struct BackendSettings {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// One outbound completion request: system instructions plus the user text.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub system: String,
    pub instruction: String,
    pub settings: BackendSettings,
}

/// Text-in/text-out completion endpoint.
///
/// Implementations report every transport or envelope failure as
/// [`DispatchError::BackendUnavailable`] and never retry on their own.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name used in logs (e.g. "openai-compatible").
    fn name(&self) -> &str;

    /// Model identifier this backend talks to.
    fn model_id(&self) -> &str;

    /// Send the request and return the model's raw text.
    async fn complete(&self, request: &BackendRequest) -> Result<String, DispatchError>;
}
