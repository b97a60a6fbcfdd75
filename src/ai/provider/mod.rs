//! Provider Adapter Abstraction
//!
//! Defines the `ProviderAdapter` trait every model backend is reached
//! through. Adapters never fail: transport errors, HTTP errors and timeouts
//! all come back as a `ProviderEnvelope` whose `error` is set.
//!
//! ## Modules
//!
//! - `adapter`: Shared base (timeout, transient retry, confidence, cost)
//! - `gemini`, `openai`, `ollama`: Wire-level backends
//! - `image`: Image references and inlining for providers that need bytes

mod adapter;
mod gemini;
mod image;
mod ollama;
mod openai;

pub use adapter::BackendAdapter;
pub use gemini::GeminiBackend;
pub use image::{ImageInput, InlineImage, mime_from_path};
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::confidence::{ConfidenceScorer, clamp_confidence};
use super::pricing::Pricing;
use crate::constants::confidence::PREMIUM_BIAS;
use crate::constants::network::DEFAULT_TIMEOUT_SECS;
use crate::constants::provider::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, MAX_TRANSIENT_RETRIES};
use crate::types::{Result, SarmaError, estimate_tokens};

// =============================================================================
// Messages and Options
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Vision detail hint (honoured by OpenAI, ignored elsewhere)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Low,
    High,
    #[default]
    Auto,
}

impl ImageDetail {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageDetail::Low => "low",
            ImageDetail::High => "high",
            ImageDetail::Auto => "auto",
        }
    }
}

/// Per-call overrides; unset fields fall back to the adapter's config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub detail: ImageDetail,
}

impl CallOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_detail(mut self, detail: ImageDetail) -> Self {
        self.detail = detail;
        self
    }
}

// =============================================================================
// Usage and Envelope
// =============================================================================

/// Token usage for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Character-based estimate for providers that omit usage
    pub fn estimated(prompt: &str, completion: &str) -> Self {
        Self::new(estimate_tokens(prompt), estimate_tokens(completion))
    }

    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Normalized result of one provider call.
///
/// Built only through `success` or `failure`, which enforce the
/// invariants: confidence in [0, 1], cost non-negative, and an errored
/// envelope carries no text and zero confidence.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderEnvelope {
    provider_id: String,
    model_id: String,
    raw_text: String,
    confidence: f32,
    usage: TokenUsage,
    cost_usd: f64,
    latency_ms: u64,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ProviderEnvelope {
    pub fn success(
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
        raw_text: impl Into<String>,
        confidence: f32,
        usage: TokenUsage,
        cost_usd: f64,
        latency: Duration,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            raw_text: raw_text.into(),
            confidence: clamp_confidence(confidence),
            usage,
            cost_usd: if cost_usd.is_finite() { cost_usd.max(0.0) } else { 0.0 },
            latency_ms: latency.as_millis() as u64,
            timestamp: Utc::now(),
            finish_reason: None,
            error: None,
        }
    }

    pub fn failure(
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
        error: impl Into<String>,
        latency: Duration,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            raw_text: String::new(),
            confidence: 0.0,
            usage: TokenUsage::default(),
            cost_usd: 0.0,
            latency_ms: latency.as_millis() as u64,
            timestamp: Utc::now(),
            finish_reason: None,
            error: Some(error.into()),
        }
    }

    pub fn with_finish_reason(mut self, reason: Option<String>) -> Self {
        self.finish_reason = reason;
        self
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn tokens_used(&self) -> u32 {
        self.usage.total()
    }

    pub fn cost_usd(&self) -> f64 {
        self.cost_usd
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// Backend family behind a provider slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Provider id reported in envelopes when the slot sets no `name`
    pub fn default_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-flash",
            ProviderKind::OpenAi => "gpt4-vision",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
            ProviderKind::OpenAi => openai::DEFAULT_MODEL,
            ProviderKind::Ollama => ollama::DEFAULT_MODEL,
        }
    }

    pub fn default_pricing(&self) -> Pricing {
        match self {
            ProviderKind::Gemini => Pricing::GEMINI_FLASH,
            ProviderKind::OpenAi => Pricing::GPT4O,
            ProviderKind::Ollama => Pricing::LOCAL,
        }
    }

    pub fn default_confidence_bias(&self) -> f32 {
        match self {
            ProviderKind::OpenAi => PREMIUM_BIAS,
            ProviderKind::Gemini | ProviderKind::Ollama => 0.0,
        }
    }

    /// Environment variable consulted when the slot has no `api_key`
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one provider slot (`ai.fast` / `ai.premium`)
///
/// Note: API keys are never serialized to output and are redacted in debug
/// output. Backends convert the key to `SecretString` at construction.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Backend family: "gemini", "openai", "ollama"
    pub kind: ProviderKind,
    /// Provider id reported in metadata (defaults per kind)
    pub name: Option<String>,
    /// Model name (provider-specific)
    pub model: Option<String>,
    /// Never serialized to output for security
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for proxies and tests)
    pub api_base: Option<String>,
    /// Budget for one call, retry included
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Transient-failure retries (0 disables)
    pub max_retries: usize,
    /// Overrides the kind's list prices
    pub pricing: Option<Pricing>,
    /// Overrides the kind's confidence bias
    pub confidence_bias: Option<f32>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("pricing", &self.pricing)
            .field("confidence_bias", &self.confidence_bias)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::for_kind(ProviderKind::default())
    }
}

impl ProviderConfig {
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            name: None,
            model: None,
            api_key: None,
            api_base: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: MAX_TRANSIENT_RETRIES,
            pricing: None,
            confidence_bias: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.default_name())
    }

    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(self.kind.default_model())
    }

    pub fn effective_pricing(&self) -> Pricing {
        self.pricing.unwrap_or_else(|| self.kind.default_pricing())
    }

    pub fn effective_confidence_bias(&self) -> f32 {
        self.confidence_bias
            .unwrap_or_else(|| self.kind.default_confidence_bias())
    }

    /// Key from config, then from the kind's environment variable
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.kind
                    .api_key_env()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.trim().is_empty())
            })
            .map(SecretString::from)
    }

    /// Whether the slot has what it needs to make calls
    pub fn is_configured(&self) -> bool {
        self.kind.api_key_env().is_none() || self.resolve_api_key().is_some()
    }

    /// Key or a `NotConfigured` error naming the variable to set
    pub(crate) fn require_api_key(&self) -> Result<SecretString> {
        self.resolve_api_key().ok_or_else(|| {
            let var = self.kind.api_key_env().unwrap_or("api_key");
            SarmaError::not_configured(
                self.display_name(),
                format!("{} not set (or ai.<slot>.api_key in config)", var),
            )
        })
    }

    pub fn validate(&self, slot: &str) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(SarmaError::Config(format!(
                "ai.{}.temperature must be between 0.0 and 2.0, got {}",
                slot, self.temperature
            )));
        }
        if self.timeout_secs == 0 {
            return Err(SarmaError::Config(format!(
                "ai.{}.timeout_secs must be greater than 0",
                slot
            )));
        }
        if self.max_tokens == 0 {
            return Err(SarmaError::Config(format!(
                "ai.{}.max_tokens must be greater than 0",
                slot
            )));
        }
        if let Some(pricing) = &self.pricing {
            pricing.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Fully resolved request handed to a wire-level backend
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Attached to the last user message
    pub image: Option<ImageInput>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub detail: ImageDetail,
}

impl CompletionRequest {
    /// Concatenated message text, for usage estimates
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Backend output before normalization
#[derive(Debug, Clone, Default)]
pub struct RawCompletion {
    pub text: String,
    /// None when the provider omitted usage data
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

/// Wire protocol of one provider family
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<RawCompletion>;

    async fn health_check(&self) -> bool;
}

/// Uniform interface over every model backend
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider id used in metadata and routing decisions
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    fn pricing(&self) -> Pricing;

    /// Cost for the given usage at this adapter's rates
    fn cost(&self, input_tokens: u32, output_tokens: u32, images: u32) -> f64 {
        self.pricing().cost(input_tokens, output_tokens, images)
    }

    async fn analyze_image(
        &self,
        image: &ImageInput,
        prompt: &str,
        options: &CallOptions,
    ) -> ProviderEnvelope;

    /// `context` becomes the system instruction when present
    async fn generate_text(
        &self,
        prompt: &str,
        context: Option<&str>,
        options: &CallOptions,
    ) -> ProviderEnvelope;

    async fn chat(&self, messages: &[ChatMessage], options: &CallOptions) -> ProviderEnvelope;

    async fn health_check(&self) -> bool;
}

/// Shared adapter type for concurrent access across services.
pub type SharedAdapter = Arc<dyn ProviderAdapter>;

/// Create a shared adapter from configuration
///
/// Fails with `NotConfigured` when a hosted provider has no API key.
pub fn create_adapter(config: &ProviderConfig, scorer: &ConfidenceScorer) -> Result<SharedAdapter> {
    let adapter: SharedAdapter = match config.kind {
        ProviderKind::Gemini => Arc::new(BackendAdapter::new(
            GeminiBackend::new(config)?,
            config,
            scorer.clone(),
        )),
        ProviderKind::OpenAi => Arc::new(BackendAdapter::new(
            OpenAiBackend::new(config)?,
            config,
            scorer.clone(),
        )),
        ProviderKind::Ollama => Arc::new(BackendAdapter::new(
            OllamaBackend::new(config)?,
            config,
            scorer.clone(),
        )),
    };
    Ok(adapter)
}

/// Build the shared HTTP client used by backends
pub(crate) fn http_client(connect_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| SarmaError::LlmApi(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success HTTP response into a classified error
pub(crate) async fn http_error(response: reqwest::Response, provider: &str) -> SarmaError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or(body);
    ErrorClassifier::classify_http_status(
        status.as_u16(),
        &format!("{} API error ({}): {}", provider, status, message),
        provider,
    )
    .into()
}

#[cfg(test)]
pub(crate) mod testing;
