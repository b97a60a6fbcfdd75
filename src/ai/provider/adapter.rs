//! Shared adapter base
//!
//! `BackendAdapter` wraps any `CompletionBackend` and owns everything that
//! must behave identically across providers: the call timeout, the single
//! transient retry, confidence scoring, usage fallback and cost.

use async_trait::async_trait;
use backon::{ConstantBuilder, Retryable};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{
    CallOptions, ChatMessage, CompletionBackend, CompletionRequest, ImageInput, ProviderAdapter,
    ProviderConfig, ProviderEnvelope, RawCompletion, TokenUsage,
};
use crate::ai::confidence::ConfidenceScorer;
use crate::ai::pricing::Pricing;
use crate::ai::timeout::{TimeoutConfig, with_timeout};
use crate::constants::provider::RETRY_DELAY_MS;
use crate::types::{Result, SarmaError};

/// Provider adapter built from a wire-level backend
pub struct BackendAdapter<B> {
    name: String,
    backend: B,
    pricing: Pricing,
    confidence_bias: f32,
    scorer: ConfidenceScorer,
    timeouts: TimeoutConfig,
    max_retries: usize,
    retry_delay: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl<B: CompletionBackend> BackendAdapter<B> {
    pub fn new(backend: B, config: &ProviderConfig, scorer: ConfidenceScorer) -> Self {
        Self {
            name: config.display_name().to_string(),
            backend,
            pricing: config.effective_pricing(),
            confidence_bias: config.effective_confidence_bias(),
            scorer,
            timeouts: TimeoutConfig::with_call_secs(config.timeout_secs),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Override the call budget (tests use short budgets)
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.provider_call = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn request(
        &self,
        messages: Vec<ChatMessage>,
        image: Option<ImageInput>,
        options: &CallOptions,
    ) -> CompletionRequest {
        CompletionRequest {
            messages,
            image,
            temperature: options.temperature.unwrap_or(self.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens),
            detail: options.detail,
        }
    }

    async fn complete_with_retry(&self, request: &CompletionRequest) -> Result<RawCompletion> {
        let backoff = ConstantBuilder::default()
            .with_delay(self.retry_delay)
            .with_max_times(self.max_retries);

        (|| self.backend.complete(request))
            .retry(backoff)
            .when(|e: &SarmaError| e.is_recoverable())
            .notify(|err: &SarmaError, delay: Duration| {
                warn!(
                    provider = %self.name,
                    "Transient failure, retrying in {:?}: {}", delay, err
                );
            })
            .await
    }

    /// Run one logical call and fold the outcome into an envelope
    async fn invoke(&self, operation: &str, request: CompletionRequest) -> ProviderEnvelope {
        let label = format!("{} {}", self.name, operation);
        let images = u32::from(request.image.is_some());
        let started = Instant::now();

        debug!(
            provider = %self.name,
            model = %self.backend.model(),
            operation,
            "Calling provider"
        );

        let result = with_timeout(
            self.timeouts.provider_call,
            self.complete_with_retry(&request),
            &label,
        )
        .await;
        let latency = started.elapsed();

        match result {
            Ok(raw) => {
                let usage = raw
                    .usage
                    .filter(|u| u.total() > 0)
                    .unwrap_or_else(|| TokenUsage::estimated(&request.prompt_text(), &raw.text));
                let cost = self
                    .pricing
                    .cost(usage.input_tokens, usage.output_tokens, images);
                let confidence = self.scorer.assess(&raw.text, self.confidence_bias);

                info!(
                    provider = %self.name,
                    operation,
                    confidence,
                    tokens = usage.total(),
                    cost_usd = cost,
                    latency_ms = latency.as_millis() as u64,
                    "Provider call completed"
                );

                ProviderEnvelope::success(
                    &self.name,
                    self.backend.model(),
                    raw.text,
                    confidence,
                    usage,
                    cost,
                    latency,
                )
                .with_finish_reason(raw.finish_reason)
            }
            Err(err) => {
                warn!(
                    provider = %self.name,
                    operation,
                    latency_ms = latency.as_millis() as u64,
                    "Provider call failed: {}", err
                );
                ProviderEnvelope::failure(
                    &self.name,
                    self.backend.model(),
                    err.to_string(),
                    latency,
                )
            }
        }
    }
}

#[async_trait]
impl<B: CompletionBackend> ProviderAdapter for BackendAdapter<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        self.backend.model()
    }

    fn pricing(&self) -> Pricing {
        self.pricing
    }

    async fn analyze_image(
        &self,
        image: &ImageInput,
        prompt: &str,
        options: &CallOptions,
    ) -> ProviderEnvelope {
        let request = self.request(vec![ChatMessage::user(prompt)], Some(image.clone()), options);
        self.invoke("analyze_image", request).await
    }

    async fn generate_text(
        &self,
        prompt: &str,
        context: Option<&str>,
        options: &CallOptions,
    ) -> ProviderEnvelope {
        let mut messages = Vec::with_capacity(2);
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            messages.push(ChatMessage::system(context));
        }
        messages.push(ChatMessage::user(prompt));
        let request = self.request(messages, None, options);
        self.invoke("generate_text", request).await
    }

    async fn chat(&self, messages: &[ChatMessage], options: &CallOptions) -> ProviderEnvelope {
        let request = self.request(messages.to_vec(), None, options);
        self.invoke("chat", request).await
    }

    async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::ProviderKind;
    use crate::types::{ErrorCategory, LlmError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that replays scripted outcomes in order
    struct ScriptedBackend {
        outcomes: Mutex<Vec<Result<RawCompletion>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedBackend {
        fn new(mut outcomes: Vec<Result<RawCompletion>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Gemini
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<RawCompletion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(SarmaError::LlmApi("script exhausted".to_string())))
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn text(s: &str) -> Result<RawCompletion> {
        Ok(RawCompletion {
            text: s.to_string(),
            usage: Some(TokenUsage::new(1000, 200)),
            finish_reason: Some("STOP".to_string()),
        })
    }

    fn transient() -> Result<RawCompletion> {
        Err(LlmError::new(ErrorCategory::Transient, "503 overloaded").into())
    }

    fn adapter(backend: ScriptedBackend) -> BackendAdapter<ScriptedBackend> {
        BackendAdapter::new(backend, &ProviderConfig::default(), ConfidenceScorer::new())
            .with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let adapter = adapter(ScriptedBackend::new(vec![text("Grilled salmon")]));
        let env = adapter
            .generate_text("describe", None, &CallOptions::default())
            .await;
        assert!(!env.is_error());
        assert_eq!(env.provider_id(), "gemini-flash");
        assert_eq!(env.raw_text(), "Grilled salmon");
        assert!((env.confidence() - 0.8).abs() < 1e-6);
        assert_eq!(env.tokens_used(), 1200);
        assert!(env.cost_usd() > 0.0);
        assert_eq!(env.finish_reason(), Some("STOP"));
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let backend = ScriptedBackend::new(vec![transient(), text("ok")]);
        let adapter = adapter(backend);
        let env = adapter.chat(&[ChatMessage::user("hi")], &CallOptions::default()).await;
        assert!(!env.is_error());
        assert_eq!(adapter.backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_transient_failure_becomes_error() {
        let backend = ScriptedBackend::new(vec![transient(), transient(), text("late")]);
        let adapter = adapter(backend);
        let env = adapter.chat(&[ChatMessage::user("hi")], &CallOptions::default()).await;
        assert!(env.is_error());
        assert!(env.error().unwrap().contains("overloaded"));
        assert_eq!(adapter.backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let auth = Err(LlmError::new(ErrorCategory::Auth, "invalid api key").into());
        let adapter = adapter(ScriptedBackend::new(vec![auth, text("never")]));
        let env = adapter
            .generate_text("x", Some("ctx"), &CallOptions::default())
            .await;
        assert!(env.is_error());
        assert_eq!(env.confidence(), 0.0);
        assert_eq!(adapter.backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_envelope() {
        let mut backend = ScriptedBackend::new(vec![text("too slow")]);
        backend.delay = Duration::from_millis(200);
        let adapter = adapter(backend).with_call_timeout(Duration::from_millis(20));
        let env = adapter
            .generate_text("x", None, &CallOptions::default())
            .await;
        assert!(env.is_error());
        assert!(env.error().unwrap().contains("Timeout"));
    }

    #[tokio::test]
    async fn test_missing_usage_is_estimated() {
        let raw = Ok(RawCompletion {
            text: "abcdefgh".to_string(),
            usage: None,
            finish_reason: None,
        });
        let adapter = adapter(ScriptedBackend::new(vec![raw]));
        let env = adapter
            .generate_text("abcd", None, &CallOptions::default())
            .await;
        assert_eq!(env.usage(), TokenUsage::new(1, 2));
    }
}
