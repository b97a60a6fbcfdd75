//! Provider Routing and Escalation
//!
//! Chooses between the fast (cheap) and premium (expensive) adapter for a
//! request, and for image analysis may retry once on the premium adapter
//! when the first answer looks unreliable.
//!
//! ## Selection
//!
//! 1. A forced provider always wins; no escalation follows.
//! 2. Otherwise the tier table applies: free → fast, premium → premium.
//! 3. Under `cheap-first`, premium image analysis starts on the fast
//!    adapter and escalates when confidence falls below the threshold.
//!
//! Each request walks `NotStarted → PrimaryCalled → (Escalating →) Done`
//! and escalates at most once.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::provider::{CallOptions, ChatMessage, ImageInput, ProviderEnvelope, SharedAdapter};
use crate::constants::routing::{CONFIDENCE_THRESHOLD, MAX_ESCALATIONS};
use crate::types::{Result, SarmaError};

// =============================================================================
// Tiers and Roles
// =============================================================================

/// Spend level the caller is entitled to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    #[default]
    #[serde(alias = "basic")]
    Free,
    Premium,
}

impl QualityTier {
    /// Whether this tier may pay for a second, premium call
    pub fn permits_escalation(&self) -> bool {
        matches!(self, QualityTier::Premium)
    }

    pub fn from_high_quality(use_high_quality: bool) -> Self {
        if use_high_quality {
            QualityTier::Premium
        } else {
            QualityTier::Free
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityTier::Free => write!(f, "free"),
            QualityTier::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" | "basic" => Ok(QualityTier::Free),
            "premium" | "pro" => Ok(QualityTier::Premium),
            _ => Err(format!(
                "Unknown quality tier: {}. Valid values: free, basic, premium",
                s
            )),
        }
    }
}

/// Which configured adapter slot serves a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    Fast,
    Premium,
}

impl std::fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderRole::Fast => write!(f, "fast"),
            ProviderRole::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for ProviderRole {
    type Err = String;

    /// Accepts slot names and the provider labels callers historically used
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" | "fast-vision" | "gemini" | "gemini-flash" => Ok(ProviderRole::Fast),
            "premium" | "premium-vision" | "gpt4-vision" | "gpt-4-vision" | "openai" => {
                Ok(ProviderRole::Premium)
            }
            _ => Err(format!(
                "Unknown provider: {}. Valid values: fast, fast-vision, gemini-flash, \
                 premium, premium-vision, gpt4-vision",
                s
            )),
        }
    }
}

/// How premium image analysis is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EscalationStrategy {
    /// Start on the fast adapter, escalate on low confidence
    #[default]
    #[serde(alias = "cheap_first")]
    CheapFirst,
    /// Go straight to the tier's adapter
    Direct,
}

/// Kind of call being routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ImageAnalysis,
    TextGeneration,
    Chat,
}

/// Routing settings (`ai.routing`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Escalate when primary confidence is strictly below this
    pub confidence_threshold: f32,
    pub escalation_strategy: EscalationStrategy,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: CONFIDENCE_THRESHOLD,
            escalation_strategy: EscalationStrategy::default(),
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SarmaError::Config(format!(
                "routing.confidence_threshold must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Decision Record
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingState {
    NotStarted,
    PrimaryCalled,
    Escalating,
    Done,
}

/// How one request was routed
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    pub request_id: Uuid,
    pub operation: Operation,
    pub requested_tier: QualityTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_provider: Option<ProviderRole>,
    /// Provider id whose envelope is returned
    pub chosen_provider: String,
    pub chosen_role: ProviderRole,
    pub escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
    /// Spend across every call made for the request, discarded ones included
    pub total_cost_usd: f64,
    /// States visited, in order
    pub states: Vec<RoutingState>,
}

impl RoutingDecision {
    fn new(operation: Operation, tier: QualityTier, forced: Option<ProviderRole>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            operation,
            requested_tier: tier,
            forced_provider: forced,
            chosen_provider: String::new(),
            chosen_role: forced.unwrap_or(ProviderRole::Fast),
            escalated: false,
            escalation_reason: None,
            total_cost_usd: 0.0,
            states: vec![RoutingState::NotStarted],
        }
    }

    fn transition(&mut self, state: RoutingState) {
        debug!(request_id = %self.request_id, ?state, "Routing transition");
        self.states.push(state);
    }

    fn record_primary(&mut self, envelope: &ProviderEnvelope) {
        self.chosen_provider = envelope.provider_id().to_string();
        self.total_cost_usd = envelope.cost_usd();
        self.transition(RoutingState::PrimaryCalled);
    }

    pub fn state(&self) -> RoutingState {
        self.states.last().copied().unwrap_or(RoutingState::NotStarted)
    }

    fn escalation_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == RoutingState::Escalating)
            .count()
    }
}

/// Final envelope plus the decision that produced it
#[derive(Debug, Clone)]
pub struct Routed {
    pub envelope: ProviderEnvelope,
    pub decision: RoutingDecision,
}

// =============================================================================
// Router
// =============================================================================

/// Routes calls between the fast and premium adapters
pub struct ProviderRouter {
    fast: SharedAdapter,
    premium: SharedAdapter,
    config: RoutingConfig,
}

impl ProviderRouter {
    pub fn new(fast: SharedAdapter, premium: SharedAdapter, config: RoutingConfig) -> Self {
        Self {
            fast,
            premium,
            config,
        }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn adapter(&self, role: ProviderRole) -> &SharedAdapter {
        match role {
            ProviderRole::Fast => &self.fast,
            ProviderRole::Premium => &self.premium,
        }
    }

    /// Slot for a forced-provider string: either adapter's configured name,
    /// then the fixed labels
    pub fn resolve_forced(&self, name: &str) -> Option<ProviderRole> {
        let wanted = name.trim();
        if wanted.eq_ignore_ascii_case(self.fast.name()) {
            Some(ProviderRole::Fast)
        } else if wanted.eq_ignore_ascii_case(self.premium.name()) {
            Some(ProviderRole::Premium)
        } else {
            wanted.parse().ok()
        }
    }

    /// Adapter slot for the first call of a request
    pub fn primary_role(
        &self,
        tier: QualityTier,
        forced: Option<ProviderRole>,
        operation: Operation,
    ) -> ProviderRole {
        if let Some(role) = forced {
            return role;
        }
        match (tier, operation, self.config.escalation_strategy) {
            (QualityTier::Free, _, _) => ProviderRole::Fast,
            (QualityTier::Premium, Operation::ImageAnalysis, EscalationStrategy::CheapFirst) => {
                ProviderRole::Fast
            }
            (QualityTier::Premium, _, _) => ProviderRole::Premium,
        }
    }

    /// Why the primary envelope should be retried on the premium adapter
    fn escalation_reason(
        &self,
        envelope: &ProviderEnvelope,
        decision: &RoutingDecision,
    ) -> Option<String> {
        if decision.forced_provider.is_some()
            || decision.chosen_role == ProviderRole::Premium
            || !decision.requested_tier.permits_escalation()
            || decision.escalation_count() >= usize::from(MAX_ESCALATIONS)
            || envelope.is_error()
        {
            return None;
        }
        (envelope.confidence() < self.config.confidence_threshold).then(|| {
            format!(
                "confidence {:.2} below threshold {:.2}",
                envelope.confidence(),
                self.config.confidence_threshold
            )
        })
    }

    /// Analyze an image, escalating once on low confidence
    pub async fn analyze_image(
        &self,
        image: &ImageInput,
        prompt: &str,
        options: &CallOptions,
        tier: QualityTier,
        forced: Option<ProviderRole>,
    ) -> Routed {
        let mut decision = RoutingDecision::new(Operation::ImageAnalysis, tier, forced);
        let role = self.primary_role(tier, forced, Operation::ImageAnalysis);
        decision.chosen_role = role;

        let primary = self
            .adapter(role)
            .analyze_image(image, prompt, options)
            .await;
        decision.record_primary(&primary);

        let Some(reason) = self.escalation_reason(&primary, &decision) else {
            return self.finish(primary, decision);
        };

        info!(
            request_id = %decision.request_id,
            from = %primary.provider_id(),
            to = %self.premium.name(),
            "Escalating image analysis: {}", reason
        );
        decision.transition(RoutingState::Escalating);

        let escalated = self.premium.analyze_image(image, prompt, options).await;
        decision.total_cost_usd += escalated.cost_usd();
        if let Some(error) = escalated.error() {
            warn!(
                request_id = %decision.request_id,
                "Escalated call failed: {}", error
            );
        }

        decision.escalated = true;
        decision.escalation_reason = Some(reason);
        decision.chosen_role = ProviderRole::Premium;
        decision.chosen_provider = escalated.provider_id().to_string();
        self.finish(escalated, decision)
    }

    /// Text generation on the tier's adapter (never escalates)
    pub async fn generate_text(
        &self,
        prompt: &str,
        context: Option<&str>,
        options: &CallOptions,
        tier: QualityTier,
        forced: Option<ProviderRole>,
    ) -> Routed {
        let mut decision = RoutingDecision::new(Operation::TextGeneration, tier, forced);
        let role = self.primary_role(tier, forced, Operation::TextGeneration);
        decision.chosen_role = role;

        let envelope = self
            .adapter(role)
            .generate_text(prompt, context, options)
            .await;
        decision.record_primary(&envelope);
        self.finish(envelope, decision)
    }

    /// Multi-turn chat on the tier's adapter (never escalates)
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CallOptions,
        tier: QualityTier,
        forced: Option<ProviderRole>,
    ) -> Routed {
        let mut decision = RoutingDecision::new(Operation::Chat, tier, forced);
        let role = self.primary_role(tier, forced, Operation::Chat);
        decision.chosen_role = role;

        let envelope = self.adapter(role).chat(messages, options).await;
        decision.record_primary(&envelope);
        self.finish(envelope, decision)
    }

    fn finish(&self, envelope: ProviderEnvelope, mut decision: RoutingDecision) -> Routed {
        decision.transition(RoutingState::Done);
        info!(
            request_id = %decision.request_id,
            operation = ?decision.operation,
            tier = %decision.requested_tier,
            provider = %decision.chosen_provider,
            escalated = decision.escalated,
            confidence = envelope.confidence(),
            cost_usd = envelope.cost_usd(),
            "Routing complete"
        );
        Routed { envelope, decision }
    }
}
