//! Capability services
//!
//! `AiServices` is built once from configuration and handed to whatever
//! needs AI. It records which provider slots are usable; asking for a
//! capability whose providers are missing yields `NotConfigured` instead of
//! a degraded answer.

mod chat_assistant;
mod meal_analyzer;
mod metadata;
mod recipe_generator;

pub use chat_assistant::{
    ChatAssistant, ChatResponse, DietTrendAnalysis, MealSuggestion, NutritionAdvice,
};
pub use meal_analyzer::{MealAnalysis, MealAnalyzer, QuickEstimateResult};
pub use metadata::AiMetadata;
pub use recipe_generator::{RecipeGenerator, RecipeResponse, SuggestionsResponse};

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ai::{
    ConfidenceScorer, ProviderConfig, ProviderKind, ProviderRole, ProviderRouter, SharedAdapter,
    create_adapter,
};
use crate::config::AiConfig;
use crate::types::{Result, SarmaError};

pub const MEAL_ANALYSIS: &str = "meal_analysis";
pub const RECIPE_GENERATION: &str = "recipe_generation";
pub const CHAT: &str = "chat";

/// Status of one provider slot
#[derive(Debug, Clone, Serialize)]
pub struct SlotStatus {
    pub slot: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProviderKind>,
    pub model: String,
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// What the process can do with its current configuration
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub providers: Vec<SlotStatus>,
    pub meal_analysis: bool,
    pub recipe_generation: bool,
    pub chat: bool,
}

impl Capabilities {
    pub fn any(&self) -> bool {
        self.meal_analysis || self.recipe_generation || self.chat
    }
}

/// Configured-capability registry
pub struct AiServices {
    router: Option<Arc<ProviderRouter>>,
    slots: Vec<SlotStatus>,
}

impl AiServices {
    /// Build adapters for both slots
    ///
    /// A slot without credentials is recorded as unconfigured. Any other
    /// construction failure (bad endpoint, unreadable settings) is returned.
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let scorer = ConfidenceScorer::with_config(config.confidence.clone());

        let (fast, fast_status) = Self::build_slot("fast", &config.fast, &scorer)?;
        let (premium, premium_status) = Self::build_slot("premium", &config.premium, &scorer)?;

        let router = match (fast, premium) {
            (Some(fast), Some(premium)) => {
                info!(
                    fast = fast.name(),
                    premium = premium.name(),
                    "AI services ready"
                );
                Some(Arc::new(ProviderRouter::new(
                    fast,
                    premium,
                    config.routing.clone(),
                )))
            }
            _ => None,
        };

        Ok(Self {
            router,
            slots: vec![fast_status, premium_status],
        })
    }

    /// Registry around an already-built router (tests, embedding)
    pub fn with_router(router: ProviderRouter) -> Self {
        let slots = [("fast", ProviderRole::Fast), ("premium", ProviderRole::Premium)]
            .into_iter()
            .map(|(slot, role)| {
                let adapter = router.adapter(role);
                SlotStatus {
                    slot,
                    name: adapter.name().to_string(),
                    kind: None,
                    model: adapter.model().to_string(),
                    configured: true,
                    reason: None,
                }
            })
            .collect();

        Self {
            router: Some(Arc::new(router)),
            slots,
        }
    }

    fn build_slot(
        slot: &'static str,
        config: &ProviderConfig,
        scorer: &ConfidenceScorer,
    ) -> Result<(Option<SharedAdapter>, SlotStatus)> {
        let mut status = SlotStatus {
            slot,
            name: config.display_name().to_string(),
            kind: Some(config.kind),
            model: config.model_name().to_string(),
            configured: false,
            reason: None,
        };

        match create_adapter(config, scorer) {
            Ok(adapter) => {
                status.configured = true;
                Ok((Some(adapter), status))
            }
            Err(SarmaError::NotConfigured { reason, .. }) => {
                warn!(slot, provider = %status.name, "Provider not configured: {}", reason);
                status.reason = Some(reason);
                Ok((None, status))
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.router.is_some()
    }

    pub fn capabilities(&self) -> Capabilities {
        let ready = self.is_configured();
        Capabilities {
            providers: self.slots.clone(),
            meal_analysis: ready,
            recipe_generation: ready,
            chat: ready,
        }
    }

    pub fn meal_analyzer(&self) -> Result<MealAnalyzer> {
        self.router(MEAL_ANALYSIS).map(MealAnalyzer::new)
    }

    pub fn recipe_generator(&self) -> Result<RecipeGenerator> {
        self.router(RECIPE_GENERATION).map(RecipeGenerator::new)
    }

    pub fn chat_assistant(&self) -> Result<ChatAssistant> {
        self.router(CHAT).map(ChatAssistant::new)
    }

    /// Reachability of each configured provider, by slot
    pub async fn health_check(&self) -> Vec<(&'static str, bool)> {
        match &self.router {
            Some(router) => {
                let slots = [("fast", ProviderRole::Fast), ("premium", ProviderRole::Premium)];
                let checks = slots
                    .iter()
                    .map(|(_, role)| router.adapter(*role).health_check());
                let results = join_all(checks).await;
                slots
                    .iter()
                    .zip(results)
                    .map(|((slot, _), healthy)| (*slot, healthy))
                    .collect()
            }
            None => self
                .slots
                .iter()
                .map(|s| (s.slot, false))
                .collect(),
        }
    }

    fn router(&self, capability: &str) -> Result<Arc<ProviderRouter>> {
        self.router
            .clone()
            .ok_or_else(|| SarmaError::not_configured(capability, self.missing_reason()))
    }

    fn missing_reason(&self) -> String {
        let reasons: Vec<String> = self
            .slots
            .iter()
            .filter(|s| !s.configured)
            .map(|s| match &s.reason {
                Some(reason) => format!("{} provider: {}", s.slot, reason),
                None => format!("{} provider missing", s.slot),
            })
            .collect();

        if reasons.is_empty() {
            "AI services not configured".to_string()
        } else {
            format!("AI services not configured ({})", reasons.join("; "))
        }
    }
}
