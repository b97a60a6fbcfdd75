//! `ai_metadata` block attached to every service response

use serde::{Deserialize, Serialize};

use crate::ai::ProviderEnvelope;

/// Usage accounting for the call whose answer was returned
///
/// Billing and analytics read this shape; fields are never renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMetadata {
    pub provider: String,
    pub model: String,
    pub confidence: f32,
    pub cost_usd: f64,
    pub response_time_ms: u64,
    pub tokens_used: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ProviderEnvelope> for AiMetadata {
    fn from(envelope: &ProviderEnvelope) -> Self {
        Self {
            provider: envelope.provider_id().to_string(),
            model: envelope.model_id().to_string(),
            confidence: envelope.confidence(),
            cost_usd: envelope.cost_usd(),
            response_time_ms: envelope.latency_ms(),
            tokens_used: envelope.tokens_used(),
            error: envelope.error().map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::TokenUsage;
    use std::time::Duration;

    #[test]
    fn test_from_success_envelope() {
        let envelope = ProviderEnvelope::success(
            "gpt4-vision",
            "gpt-4o",
            "{}",
            0.92,
            TokenUsage::new(1200, 300),
            0.0105,
            Duration::from_millis(1840),
        );
        let meta = AiMetadata::from(&envelope);
        assert_eq!(meta.provider, "gpt4-vision");
        assert_eq!(meta.model, "gpt-4o");
        assert_eq!(meta.tokens_used, 1500);
        assert_eq!(meta.response_time_ms, 1840);
        assert!(meta.error.is_none());

        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["cost_usd"], 0.0105);
    }

    #[test]
    fn test_from_failure_envelope() {
        let envelope = ProviderEnvelope::failure(
            "gemini-flash",
            "gemini-2.0-flash-exp",
            "timed out",
            Duration::from_secs(30),
        );
        let meta = AiMetadata::from(&envelope);
        assert_eq!(meta.confidence, 0.0);
        assert_eq!(meta.cost_usd, 0.0);
        assert_eq!(meta.tokens_used, 0);
        assert_eq!(meta.error.as_deref(), Some("timed out"));
    }
}
