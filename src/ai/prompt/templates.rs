//! Capability prompts

use super::PromptBuilder;
use super::context::{format_user_context, summarize_meals};
use crate::types::{MealSummary, MealType, RecipePreference, RecipeRequest, UserContext};

/// System prompt for every conversational and advisory call
pub const CHAT_SYSTEM_PROMPT: &str = "You are Sarma, an expert nutrition and health assistant. Your role is to:

1. **Provide accurate nutrition advice** based on current scientific evidence
2. **Suggest healthy meals** tailored to user preferences and goals
3. **Answer health questions** about diet, weight management, and wellness
4. **Motivate and encourage** users on their health journey
5. **Be conversational and friendly** while maintaining professionalism

Guidelines:
- Always prioritize user safety - recommend consulting doctors for medical issues
- Provide practical, actionable advice
- Consider dietary restrictions and allergies
- Be positive and encouraging
- Use simple language, avoid excessive jargon
- When unsure, acknowledge limitations

You have access to the user's meal history, health goals, and dietary preferences through context.";

const MEAL_SCHEMA: &str = r#"
{
  "meal_name": "Brief description of the meal",
  "ingredients": ["ingredient1", "ingredient2", ...],
  "portions": {
    "ingredient1": "estimated amount (e.g., 150g, 1 cup)",
    "ingredient2": "estimated amount"
  },
  "nutrition": {
    "calories": 450,
    "protein_g": 25.5,
    "carbs_g": 45.0,
    "fat_g": 15.0,
    "fiber_g": 5.0,
    "sugar_g": 8.0,
    "sodium_mg": 650
  },
  "meal_type": "breakfast|lunch|dinner|snack",
  "confidence_notes": "Any uncertainties or assumptions made"
}
"#;

const QUICK_SCHEMA: &str = r#"
{
  "calories": <estimated calories>,
  "description": "brief meal description"
}
"#;

const RECIPE_SCHEMA: &str = r#"
{
  "name": "Recipe name",
  "description": "Appetizing description (2-3 sentences)",
  "ingredients": [
    "1 cup ingredient 1",
    "2 tablespoons ingredient 2",
    ...
  ],
  "instructions": [
    "Step 1: Detailed instruction",
    "Step 2: Detailed instruction",
    ...
  ],
  "prep_time_min": 15,
  "cook_time_min": 30,
  "servings": 4,
  "difficulty": "easy|medium|hard",
  "nutrition_per_serving": {
    "calories": 350,
    "protein_g": 25,
    "carbs_g": 40,
    "fat_g": 10,
    "fiber_g": 5,
    "sugar_g": 8,
    "sodium_mg": 500
  },
  "tags": ["quick", "healthy", "family-friendly"],
  "cuisine": "Italian",
  "dietary_info": ["vegetarian", "gluten-free"]
}
"#;

const SUGGESTION_SCHEMA: &str = r#"
[
  {
    "name": "Recipe name",
    "description": "Why this recipe fits the user",
    "key_benefits": ["benefit1", "benefit2"],
    "estimated_calories": 400,
    "prep_time_min": 20,
    "difficulty": "easy"
  },
  ...
]
"#;

const JSON_ONLY: &str = "Return ONLY valid JSON, no additional text before or after.";

/// Preset prompts for each capability
pub struct PromptTemplates;

impl PromptTemplates {
    /// Full nutrition breakdown of a meal photo
    pub fn meal_analysis() -> String {
        PromptBuilder::new()
            .lead("Analyze this meal photo and provide detailed nutrition information.")
            .schema(
                "Your response MUST be in valid JSON format following this structure:",
                MEAL_SCHEMA,
            )
            .numbered(
                "Instructions:",
                &[
                    "Identify ALL visible food items",
                    "Estimate portion sizes based on typical serving sizes",
                    "Calculate total nutrition for the ENTIRE meal",
                    "Be as accurate as possible with nutritional values",
                    "Include notes about any uncertainties",
                    "If you cannot clearly identify something, mention it in confidence_notes",
                ],
            )
            .closing(JSON_ONLY)
            .build()
    }

    /// Two-field calorie estimate of a meal photo
    pub fn quick_estimate() -> String {
        PromptBuilder::new()
            .lead("Analyze this meal and provide a quick estimate:")
            .schema("Return JSON format:", QUICK_SCHEMA)
            .build()
    }

    pub fn recipe(request: &RecipeRequest) -> String {
        let mut builder = PromptBuilder::new()
            .lead("Create a detailed, delicious recipe with the following requirements:")
            .requirement_list("Must include these ingredients", &request.ingredients)
            .requirement_list("Dietary restrictions", &request.dietary_restrictions)
            .requirement_list("Health goals", &request.health_goals);

        if let Some(cuisine) = request.cuisine.as_deref().filter(|c| !c.trim().is_empty()) {
            builder = builder.requirement("Cuisine type", cuisine.trim());
        }
        if let Some(max) = request.max_calories.filter(|m| *m > 0) {
            builder = builder.requirement("Max calories per serving", max.to_string());
        }
        if let Some(meal_type) = request.meal_type {
            builder = builder.requirement("Meal type", meal_type.as_str());
        }

        builder
            .schema("Return a complete recipe in JSON format:", RECIPE_SCHEMA)
            .closing("Make it delicious, practical, and aligned with the requirements!")
            .build()
    }

    pub fn recipe_from_photo(preference: RecipePreference) -> String {
        PromptBuilder::new()
            .lead("Analyze this meal photo and create a detailed recipe.")
            .text(preference.instruction())
            .schema("Return JSON format:", RECIPE_SCHEMA)
            .build()
    }

    pub fn recipe_suggestions(preferences: &UserContext, count: usize) -> String {
        let rendered = serde_json::to_string_pretty(preferences)
            .unwrap_or_else(|_| format_user_context(Some(preferences)));
        PromptBuilder::new()
            .lead(format!(
                "Suggest {} recipe ideas for a user with these preferences:",
                count
            ))
            .text(rendered)
            .schema("Return JSON array:", SUGGESTION_SCHEMA)
            .closing("Focus on variety - different meal types, cuisines, and cooking methods.")
            .build()
    }

    pub fn suggest_meal(meal_type: MealType, context: Option<&UserContext>) -> String {
        let meal = meal_type.as_str();
        PromptBuilder::new()
            .lead(format!("The user is asking for a {} suggestion.", meal))
            .section("Based on their context:", format_user_context(context))
            .numbered(
                &format!("Suggest a specific {} that:", meal),
                &[
                    "Fits their dietary preferences and restrictions",
                    "Helps them reach their health goals",
                    "Provides good nutrition balance",
                    "Is practical and enjoyable",
                ],
            )
            .bullets(
                "Provide:",
                &[
                    "Meal name and description",
                    "Why this meal is a good choice for them",
                    "Key nutrition highlights",
                    "Quick preparation tips (if relevant)",
                ],
            )
            .closing("Be specific, enthusiastic, and helpful!")
            .build()
    }

    pub fn nutrition_advice(question: &str, context: Option<&UserContext>) -> String {
        PromptBuilder::new()
            .lead("The user has a nutrition/health question:")
            .text(format!("\"{}\"", question.trim()))
            .section("User context:", format_user_context(context))
            .numbered(
                "Provide a helpful, accurate response that:",
                &[
                    "Addresses their specific question",
                    "Considers their personal context (goals, restrictions, history)",
                    "Provides actionable advice",
                    "Includes relevant scientific basis when appropriate",
                    "Reminds them to consult healthcare providers for medical concerns",
                ],
            )
            .closing("Be thorough but concise. Focus on practical guidance.")
            .build()
    }

    pub fn diet_trends(meals: &[MealSummary], period_days: u32) -> String {
        PromptBuilder::new()
            .lead(format!(
                "Analyze this user's eating patterns over the last {} days:",
                period_days
            ))
            .text(summarize_meals(meals))
            .numbered(
                "Provide:",
                &[
                    "**Nutrition Trends**: What patterns do you see? (e.g., consistent protein, low vegetables, high sodium)",
                    "**Strengths**: What are they doing well?",
                    "**Areas for Improvement**: What could be better?",
                    "**Specific Recommendations**: 3-5 actionable suggestions to improve their diet",
                    "**Encouragement**: Positive, motivating message",
                ],
            )
            .closing("Be specific, constructive, and encouraging!")
            .build()
    }

    /// Chat system message, with the user's profile appended when present
    pub fn chat_system(context: Option<&UserContext>) -> String {
        match context.filter(|c| !c.is_empty()) {
            Some(ctx) => format!(
                "{}\n\nUser Context:\n{}",
                CHAT_SYSTEM_PROMPT,
                format_user_context(Some(ctx))
            ),
            None => CHAT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_analysis_prompt() {
        let prompt = PromptTemplates::meal_analysis();
        assert!(prompt.starts_with("Analyze this meal photo"));
        assert!(prompt.contains("\"sodium_mg\": 650"));
        assert!(prompt.contains("6. If you cannot clearly identify something"));
        assert!(prompt.ends_with(JSON_ONLY));
    }

    #[test]
    fn test_recipe_prompt_omits_missing_requirements() {
        let request = RecipeRequest {
            ingredients: vec!["chicken".into(), "rice".into()],
            max_calories: Some(600),
            meal_type: Some(MealType::Dinner),
            ..Default::default()
        };
        let prompt = PromptTemplates::recipe(&request);
        assert!(prompt.contains("**Must include these ingredients:** chicken, rice"));
        assert!(prompt.contains("**Max calories per serving:** 600"));
        assert!(prompt.contains("**Meal type:** dinner"));
        assert!(!prompt.contains("Dietary restrictions"));
        assert!(!prompt.contains("Cuisine type"));
    }

    #[test]
    fn test_photo_prompt_carries_preference() {
        let prompt = PromptTemplates::recipe_from_photo(RecipePreference::Healthier);
        assert!(prompt.contains("fewer calories, less fat, and more vegetables"));
        assert!(prompt.contains("nutrition_per_serving"));
    }

    #[test]
    fn test_suggestions_prompt() {
        let prefs = UserContext {
            dietary_restrictions: vec!["vegan".into()],
            ..Default::default()
        };
        let prompt = PromptTemplates::recipe_suggestions(&prefs, 3);
        assert!(prompt.starts_with("Suggest 3 recipe ideas"));
        assert!(prompt.contains("\"vegan\""));
        assert!(prompt.contains("Return JSON array:"));
    }

    #[test]
    fn test_chat_system_with_context() {
        let ctx = UserContext {
            health_goals: vec!["build muscle".into()],
            ..Default::default()
        };
        let system = PromptTemplates::chat_system(Some(&ctx));
        assert!(system.starts_with("You are Sarma"));
        assert!(system.ends_with("User Context:\n**Health Goals:** build muscle"));
        assert_eq!(PromptTemplates::chat_system(None), CHAT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_trends_prompt_lists_meals() {
        let meals = vec![MealSummary {
            name: Some("Salad".into()),
            ..Default::default()
        }];
        let prompt = PromptTemplates::diet_trends(&meals, 14);
        assert!(prompt.contains("over the last 14 days"));
        assert!(prompt.contains("1. Salad"));
    }

    #[test]
    fn test_suggest_meal_and_advice() {
        let meal = PromptTemplates::suggest_meal(MealType::Breakfast, None);
        assert!(meal.contains("Suggest a specific breakfast that:"));
        assert!(meal.contains("No user context available"));

        let advice = PromptTemplates::nutrition_advice("Is oat milk healthy?", None);
        assert!(advice.contains("\"Is oat milk healthy?\""));
    }
}
