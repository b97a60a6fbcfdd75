//! AI Integration Layer
//!
//! Provider adapters, routing between the fast and premium models, and the
//! tolerant parsing that turns model text into typed records.

pub mod confidence;
pub mod parser;
pub mod pricing;
pub mod prompt;
pub mod provider;
pub mod router;
pub mod timeout;

pub use confidence::{ConfidenceConfig, ConfidenceScore, ConfidenceScorer, clamp_confidence};
pub use parser::{JsonRepairer, JsonShape, ResponseParser};
pub use pricing::Pricing;
pub use prompt::{CHAT_SYSTEM_PROMPT, PromptBuilder, PromptSection, PromptTemplates};
pub use provider::{
    CallOptions, ChatMessage, ErrorCategory, ErrorClassifier, ImageDetail, ImageInput, LlmError,
    ProviderAdapter, ProviderConfig, ProviderEnvelope, ProviderKind, Role, SharedAdapter,
    TokenUsage, create_adapter,
};
pub use router::{
    EscalationStrategy, Operation, ProviderRole, ProviderRouter, QualityTier, Routed,
    RoutingConfig, RoutingDecision, RoutingState,
};
pub use timeout::{TimeoutConfig, with_timeout};
