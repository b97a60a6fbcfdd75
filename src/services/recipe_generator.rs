//! Recipe generation
//!
//! Text recipes and suggestions run on the tier's provider. Recipes from a
//! photo always run on the premium provider, whatever the caller's tier.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{instrument, warn};

use super::AiMetadata;
use crate::ai::{
    CallOptions, ImageDetail, ImageInput, PromptTemplates, ProviderRole, ProviderRouter,
    QualityTier, ResponseParser, Routed, RoutingDecision,
};
use crate::constants::services::DEFAULT_SUGGESTION_COUNT;
use crate::types::{RecipePreference, RecipeRecord, RecipeRequest, RecipeSuggestion, UserContext};

#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub recipe: RecipeRecord,
    pub ai_metadata: AiMetadata,
    pub routing: RoutingDecision,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<RecipeSuggestion>,
    pub ai_metadata: AiMetadata,
    pub generated_at: DateTime<Utc>,
}

pub struct RecipeGenerator {
    router: Arc<ProviderRouter>,
    parser: ResponseParser,
}

impl RecipeGenerator {
    pub fn new(router: Arc<ProviderRouter>) -> Self {
        Self {
            router,
            parser: ResponseParser::new(),
        }
    }

    /// Recipe meeting the requested constraints
    #[instrument(skip_all, fields(hq = use_high_quality))]
    pub async fn generate_recipe(
        &self,
        request: &RecipeRequest,
        use_high_quality: bool,
    ) -> RecipeResponse {
        let prompt = PromptTemplates::recipe(request);
        let routed = self
            .router
            .generate_text(
                &prompt,
                None,
                &CallOptions::default(),
                QualityTier::from_high_quality(use_high_quality),
                None,
            )
            .await;
        self.recipe_response(routed)
    }

    /// Recipe recreating, lightening or riffing on a pictured dish
    #[instrument(skip_all, fields(preference = %preference))]
    pub async fn generate_from_photo(
        &self,
        image: &ImageInput,
        preference: RecipePreference,
    ) -> RecipeResponse {
        let prompt = PromptTemplates::recipe_from_photo(preference);
        let options = CallOptions::default().with_detail(ImageDetail::High);
        let routed = self
            .router
            .analyze_image(
                image,
                &prompt,
                &options,
                QualityTier::Premium,
                Some(ProviderRole::Premium),
            )
            .await;
        self.recipe_response(routed)
    }

    /// Up to `count` recipe ideas for the user's preferences
    #[instrument(skip_all, fields(count = count, hq = use_high_quality))]
    pub async fn suggest_recipes(
        &self,
        preferences: &UserContext,
        count: usize,
        use_high_quality: bool,
    ) -> SuggestionsResponse {
        let count = if count == 0 { DEFAULT_SUGGESTION_COUNT } else { count };
        let prompt = PromptTemplates::recipe_suggestions(preferences, count);
        let routed = self
            .router
            .generate_text(
                &prompt,
                None,
                &CallOptions::default(),
                QualityTier::from_high_quality(use_high_quality),
                None,
            )
            .await;

        let suggestions = if routed.envelope.is_error() {
            Vec::new()
        } else {
            self.parser.suggestions(routed.envelope.raw_text(), count)
        };

        SuggestionsResponse {
            suggestions,
            ai_metadata: AiMetadata::from(&routed.envelope),
            generated_at: Utc::now(),
        }
    }

    fn recipe_response(&self, routed: Routed) -> RecipeResponse {
        let recipe = match routed.envelope.error() {
            Some(error) => {
                warn!(
                    provider = routed.envelope.provider_id(),
                    "Recipe generation failed: {}", error
                );
                RecipeRecord::unparsed(error)
            }
            None => self.parser.recipe(routed.envelope.raw_text()),
        };

        RecipeResponse {
            recipe,
            ai_metadata: AiMetadata::from(&routed.envelope),
            routing: routed.decision,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::RoutingConfig;
    use crate::ai::provider::testing::{StubAdapter, as_shared};
    use crate::types::Difficulty;

    const RECIPE_JSON: &str = r#"Here you go!
{"name": "Greek Yogurt Parfait", "ingredients": ["1 cup yogurt", "1/2 cup berries"],
 "instructions": ["Layer", "Serve"], "prep_time_min": 5, "cook_time_min": 0, "servings": 1,
 "difficulty": "easy", "nutrition_per_serving": {"calories": 280, "protein_g": 20, "carbs_g": 35, "fat_g": 6}}"#;

    fn generator(fast: &Arc<StubAdapter>, premium: &Arc<StubAdapter>) -> RecipeGenerator {
        RecipeGenerator::new(Arc::new(ProviderRouter::new(
            as_shared(fast),
            as_shared(premium),
            RoutingConfig::default(),
        )))
    }

    #[tokio::test]
    async fn test_generate_recipe_on_fast_provider() {
        let fast = StubAdapter::new("gemini-flash", RECIPE_JSON, 0.8).shared();
        let premium = StubAdapter::new("gpt4-vision", "", 0.9).shared();
        let request = RecipeRequest {
            ingredients: vec!["yogurt".into()],
            ..Default::default()
        };

        let response = generator(&fast, &premium).generate_recipe(&request, false).await;

        assert_eq!(response.recipe.name, "Greek Yogurt Parfait");
        assert_eq!(response.recipe.difficulty, Difficulty::Easy);
        assert_eq!(response.recipe.nutrition.calories, 280.0);
        assert_eq!(response.ai_metadata.provider, "gemini-flash");
        assert!(fast.prompts()[0].contains("**Must include these ingredients:** yogurt"));
    }

    #[tokio::test]
    async fn test_high_quality_uses_premium() {
        let fast = StubAdapter::new("gemini-flash", "", 0.8).shared();
        let premium = StubAdapter::new("gpt4-vision", RECIPE_JSON, 0.9).shared();

        let response = generator(&fast, &premium)
            .generate_recipe(&RecipeRequest::default(), true)
            .await;
        assert_eq!(response.ai_metadata.provider, "gpt4-vision");
        assert_eq!(fast.calls(), 0);
    }

    #[tokio::test]
    async fn test_photo_recipe_always_premium() {
        let fast = StubAdapter::new("gemini-flash", RECIPE_JSON, 0.95).shared();
        let premium = StubAdapter::new("gpt4-vision", RECIPE_JSON, 0.9).shared();
        let image = ImageInput::Url("https://example.com/lasagna.jpg".into());

        let response = generator(&fast, &premium)
            .generate_from_photo(&image, RecipePreference::Healthier)
            .await;

        assert_eq!(response.ai_metadata.provider, "gpt4-vision");
        assert_eq!(response.routing.forced_provider, Some(ProviderRole::Premium));
        assert_eq!(fast.calls(), 0);
        assert!(premium.prompts()[0].contains("healthier version"));
    }

    #[tokio::test]
    async fn test_failed_generation_returns_placeholder() {
        let fast = StubAdapter::failing("gemini-flash", "Rate limit exceeded").shared();
        let premium = StubAdapter::new("gpt4-vision", "", 0.9).shared();

        let response = generator(&fast, &premium)
            .generate_recipe(&RecipeRequest::default(), false)
            .await;
        assert_eq!(response.recipe.name, "Recipe Generation Error");
        assert_eq!(response.ai_metadata.error.as_deref(), Some("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_suggestions_truncated_to_count() {
        let text = r#"[{"name": "A"}, {"name": "B"}, {"name": "C"}]"#;
        let fast = StubAdapter::new("gemini-flash", text, 0.8).shared();
        let premium = StubAdapter::new("gpt4-vision", "", 0.9).shared();

        let response = generator(&fast, &premium)
            .suggest_recipes(&UserContext::default(), 2, false)
            .await;
        assert_eq!(response.suggestions.len(), 2);
        assert!(fast.prompts()[0].starts_with("Suggest 2 recipe ideas"));
    }

    #[tokio::test]
    async fn test_suggestions_unparseable_is_empty() {
        let fast = StubAdapter::new("gemini-flash", "Try soup!", 0.8).shared();
        let premium = StubAdapter::new("gpt4-vision", "", 0.9).shared();

        let response = generator(&fast, &premium)
            .suggest_recipes(&UserContext::default(), 0, false)
            .await;
        assert!(response.suggestions.is_empty());
        assert!(fast.prompts()[0].starts_with("Suggest 5 recipe ideas"));
    }
}
