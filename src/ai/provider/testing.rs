//! Canned adapter for routing and service tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    CallOptions, ChatMessage, ImageInput, ProviderAdapter, ProviderEnvelope, SharedAdapter,
    TokenUsage,
};
use crate::ai::pricing::Pricing;

/// Adapter that answers every call with the same text and confidence
pub struct StubAdapter {
    name: String,
    text: String,
    confidence: f32,
    error: Option<String>,
    pricing: Pricing,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubAdapter {
    pub fn new(name: &str, text: &str, confidence: f32) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
            confidence,
            error: None,
            pricing: Pricing::GEMINI_FLASH,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(name, "", 0.0)
        }
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt (or flattened chat) this stub received
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn respond(&self, prompt: String) -> ProviderEnvelope {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt);
        match &self.error {
            Some(error) => ProviderEnvelope::failure(&self.name, "stub", error, Duration::ZERO),
            None => {
                let usage = TokenUsage::new(100, 50);
                ProviderEnvelope::success(
                    &self.name,
                    "stub",
                    &self.text,
                    self.confidence,
                    usage,
                    self.pricing.cost(usage.input_tokens, usage.output_tokens, 1),
                    Duration::from_millis(10),
                )
            }
        }
    }
}

pub fn as_shared(stub: &Arc<StubAdapter>) -> SharedAdapter {
    stub.clone()
}

#[async_trait]
impl ProviderAdapter for StubAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "stub"
    }

    fn pricing(&self) -> Pricing {
        self.pricing
    }

    async fn analyze_image(
        &self,
        _image: &ImageInput,
        prompt: &str,
        _options: &CallOptions,
    ) -> ProviderEnvelope {
        self.respond(prompt.to_string())
    }

    async fn generate_text(
        &self,
        prompt: &str,
        context: Option<&str>,
        _options: &CallOptions,
    ) -> ProviderEnvelope {
        let full = match context {
            Some(ctx) => format!("{}\n\n{}", ctx, prompt),
            None => prompt.to_string(),
        };
        self.respond(full)
    }

    async fn chat(&self, messages: &[ChatMessage], _options: &CallOptions) -> ProviderEnvelope {
        let flat = messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n");
        self.respond(flat)
    }

    async fn health_check(&self) -> bool {
        self.error.is_none()
    }
}
