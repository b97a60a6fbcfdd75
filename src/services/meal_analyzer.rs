//! Meal photo analysis
//!
//! Full analysis goes through the router (tier table, optional forced
//! provider, escalation on low confidence). The quick estimate always uses
//! the fast provider with a two-field prompt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{instrument, warn};

use super::AiMetadata;
use crate::ai::{
    CallOptions, ImageDetail, ImageInput, PromptTemplates, ProviderRole, ProviderRouter,
    QualityTier, ResponseParser, RoutingDecision,
};
use crate::types::{NutritionRecord, QuickEstimate, Result, SarmaError};

/// Result of `analyze_meal`
#[derive(Debug, Clone, Serialize)]
pub struct MealAnalysis {
    pub nutrition: NutritionRecord,
    pub ai_metadata: AiMetadata,
    pub routing: RoutingDecision,
    pub analyzed_at: DateTime<Utc>,
}

/// Result of `quick_calorie_estimate`
#[derive(Debug, Clone, Serialize)]
pub struct QuickEstimateResult {
    #[serde(flatten)]
    pub estimate: QuickEstimate,
    pub cost_usd: f64,
    pub response_time_ms: u64,
}

pub struct MealAnalyzer {
    router: Arc<ProviderRouter>,
    parser: ResponseParser,
}

impl MealAnalyzer {
    pub fn new(router: Arc<ProviderRouter>) -> Self {
        Self {
            router,
            parser: ResponseParser::new(),
        }
    }

    /// Nutrition facts for a meal photo
    #[instrument(skip_all, fields(tier = %tier, forced = ?forced))]
    pub async fn analyze_meal(
        &self,
        image: &ImageInput,
        tier: QualityTier,
        forced: Option<ProviderRole>,
    ) -> MealAnalysis {
        let prompt = PromptTemplates::meal_analysis();
        let options = CallOptions::default().with_detail(ImageDetail::High);
        let routed = self
            .router
            .analyze_image(image, &prompt, &options, tier, forced)
            .await;

        let nutrition = match routed.envelope.error() {
            Some(error) => {
                warn!(
                    provider = routed.envelope.provider_id(),
                    "Meal analysis failed: {}", error
                );
                NutritionRecord::empty(format!("Analysis failed: {}", error))
            }
            None => self.parser.nutrition(routed.envelope.raw_text()),
        };

        MealAnalysis {
            nutrition,
            ai_metadata: AiMetadata::from(&routed.envelope),
            routing: routed.decision,
            analyzed_at: Utc::now(),
        }
    }

    /// Slot for a forced-provider argument (adapter name or slot label)
    pub fn resolve_provider(&self, name: &str) -> Result<ProviderRole> {
        self.router.resolve_forced(name).ok_or_else(|| {
            SarmaError::Config(format!(
                "Unknown provider: {}. Valid values: {}, {}, fast, fast-vision, \
                 gemini-flash, premium, premium-vision, gpt4-vision",
                name,
                self.router.adapter(ProviderRole::Fast).name(),
                self.router.adapter(ProviderRole::Premium).name()
            ))
        })
    }

    /// Calories and a one-line description from the fast provider
    #[instrument(skip_all)]
    pub async fn quick_calorie_estimate(&self, image: &ImageInput) -> QuickEstimateResult {
        let prompt = PromptTemplates::quick_estimate();
        let routed = self
            .router
            .analyze_image(
                image,
                &prompt,
                &CallOptions::default(),
                QualityTier::Free,
                Some(ProviderRole::Fast),
            )
            .await;
        let envelope = &routed.envelope;

        let estimate = match envelope.error() {
            Some(error) => QuickEstimate::unanalyzed(error),
            None => self.parser.quick_estimate(envelope.raw_text()),
        };

        QuickEstimateResult {
            estimate,
            cost_usd: envelope.cost_usd(),
            response_time_ms: envelope.latency_ms(),
        }
    }
}
