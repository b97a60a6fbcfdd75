//! Response parsing
//!
//! Turns raw model text into typed records. Parsing is total: every input
//! yields a well-formed record, degrading from strict JSON (confidence 0.8)
//! to prose extraction (0.6) to an empty record (0.0).

mod fallback;
mod json_repair;
mod nutrition;
mod recipe;

pub use fallback::{extract_ingredients, extract_nutrition};
pub use json_repair::{JsonRepairer, JsonShape};
pub use nutrition::nutrition_from_value;
pub use recipe::{recipe_from_prose, recipe_from_value, suggestion_from_value};

use serde_json::Value;
use tracing::debug;

use crate::constants::parser::{NOTE_PREVIEW_CHARS, UNKNOWN_MEAL};
use crate::types::{
    NutritionRecord, QuickEstimate, RecipeRecord, RecipeSuggestion, coerce_f64, json_string,
    preview,
};

/// Parser for nutrition, estimate and recipe responses
#[derive(Default)]
pub struct ResponseParser {
    repairer: JsonRepairer,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn object(&self, text: &str) -> Option<Value> {
        match self.repairer.parse_or_repair(text, JsonShape::Object) {
            Ok((value, repaired)) => {
                if repaired {
                    debug!("response JSON needed repair");
                }
                Some(value)
            }
            Err(e) => {
                debug!(error = %e, "no JSON object in response");
                None
            }
        }
    }

    /// Nutrition facts from a meal analysis response
    pub fn nutrition(&self, text: &str) -> NutritionRecord {
        if text.trim().is_empty() {
            return NutritionRecord::empty("Empty response from model");
        }

        if let Some(value) = self.object(text)
            && nutrition::has_nutrition_fields(&value)
        {
            return nutrition_from_value(&value);
        }

        if let Some(record) = extract_nutrition(text) {
            return record;
        }

        NutritionRecord::empty(format!(
            "No nutrition data found in response: {}",
            preview(text.trim(), NOTE_PREVIEW_CHARS)
        ))
    }

    /// Calorie estimate from a short text description
    pub fn quick_estimate(&self, text: &str) -> QuickEstimate {
        if let Some(value) = self.object(text) {
            let calories = ["calories", "estimated_calories", "kcal"]
                .iter()
                .find_map(|key| value.get(*key).and_then(coerce_f64));
            if let Some(calories) = calories {
                return QuickEstimate {
                    calories: calories.max(0.0),
                    description: json_string(&value, "description")
                        .or_else(|| json_string(&value, "meal_name"))
                        .unwrap_or_else(|| UNKNOWN_MEAL.to_string()),
                    error: None,
                };
            }
        }

        match extract_nutrition(text).filter(|r| r.calories > 0.0) {
            Some(record) => QuickEstimate {
                calories: record.calories,
                description: preview(text.trim(), NOTE_PREVIEW_CHARS),
                error: None,
            },
            None => QuickEstimate::unanalyzed(format!(
                "No calorie estimate in response: {}",
                preview(text.trim(), NOTE_PREVIEW_CHARS)
            )),
        }
    }

    /// Full recipe from a generation response
    pub fn recipe(&self, text: &str) -> RecipeRecord {
        if let Some(value) = self.object(text) {
            // A wrapper like {"recipe": {...}} is unwrapped one level
            let inner = value.get("recipe").filter(|v| v.is_object()).unwrap_or(&value);
            if recipe::has_recipe_fields(inner) {
                return recipe_from_value(inner);
            }
        }

        recipe_from_prose(text).unwrap_or_else(|| {
            RecipeRecord::unparsed(format!(
                "no recipe structure found: {}",
                preview(text.trim(), NOTE_PREVIEW_CHARS)
            ))
        })
    }

    /// Up to `count` named suggestions; empty when nothing usable came back
    pub fn suggestions(&self, text: &str, count: usize) -> Vec<RecipeSuggestion> {
        let items = match self.repairer.parse_or_repair(text, JsonShape::Array) {
            Ok((Value::Array(items), _)) => items,
            _ => self
                .object(text)
                .and_then(|value| {
                    ["suggestions", "recipes"]
                        .iter()
                        .find_map(|key| value.get(*key).and_then(Value::as_array).cloned())
                })
                .unwrap_or_default(),
        };

        items
            .iter()
            .filter_map(suggestion_from_value)
            .take(count)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;
    use proptest::prelude::*;

    #[test]
    fn test_nutrition_json_path() {
        let text = r#"```json
{"meal_name": "Oatmeal", "nutrition": {"calories": 300, "protein_g": 10, "carbs_g": 54, "fat_g": 6}}
```"#;
        let record = ResponseParser::new().nutrition(text);
        assert_eq!(record.calories, 300.0);
        assert_eq!(record.confidence, 0.8);
    }

    #[test]
    fn test_nutrition_prose_path() {
        let record = ResponseParser::new().nutrition("Roughly 450 calories and 30g protein.");
        assert_eq!(record.calories, 450.0);
        assert_eq!(record.protein_g, 30.0);
        assert_eq!(record.confidence, 0.6);
    }

    #[test]
    fn test_json_without_fields_falls_back_to_prose() {
        let text = r#"{"error": "blurry"} but it looks like 350 calories"#;
        let record = ResponseParser::new().nutrition(text);
        assert_eq!(record.calories, 350.0);
        assert_eq!(record.confidence, 0.6);
    }

    #[test]
    fn test_nutrition_nothing_found() {
        let record = ResponseParser::new().nutrition("I can't identify any food here.");
        assert!(record.has_no_macros());
        assert_eq!(record.confidence, 0.0);
        assert!(record.notes.unwrap().contains("can't identify"));

        let record = ResponseParser::new().nutrition("   ");
        assert!(record.notes.unwrap().contains("Empty"));
    }

    #[test]
    fn test_quick_estimate_json() {
        let estimate = ResponseParser::new()
            .quick_estimate(r#"{"calories": 410, "description": "Turkey sandwich on wheat"}"#);
        assert_eq!(estimate.calories, 410.0);
        assert_eq!(estimate.description, "Turkey sandwich on wheat");
        assert!(estimate.error.is_none());
    }

    #[test]
    fn test_quick_estimate_without_description() {
        let estimate = ResponseParser::new().quick_estimate(r#"{"calories": 300}"#);
        assert_eq!(estimate.calories, 300.0);
        assert_eq!(estimate.description, "Unknown meal");
    }

    #[test]
    fn test_quick_estimate_prose_and_failure() {
        let parser = ResponseParser::new();
        assert_eq!(parser.quick_estimate("That is about 250 kcal.").calories, 250.0);

        let failed = parser.quick_estimate("no idea");
        assert_eq!(failed.calories, 0.0);
        assert_eq!(failed.description, "Could not analyze");
        assert!(failed.error.is_some());
    }

    #[test]
    fn test_recipe_wrapped_payload() {
        let recipe = ResponseParser::new()
            .recipe(r#"{"recipe": {"name": "Pesto Pasta", "servings": 4, "difficulty": "easy"}}"#);
        assert_eq!(recipe.name, "Pesto Pasta");
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_recipe_unparsed() {
        let recipe = ResponseParser::new().recipe("I'd rather not.");
        assert_eq!(recipe.name, "Recipe Generation Error");
        assert_eq!(recipe.confidence, 0.0);
    }

    #[test]
    fn test_suggestions_array_truncated() {
        let text = r#"[{"name": "A"}, {"description": "no name"}, {"name": "B"}, {"name": "C"}]"#;
        let names: Vec<String> = ResponseParser::new()
            .suggestions(text, 2)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_suggestions_wrapped_object() {
        let text = r#"{"suggestions": [{"name": "Miso Soup", "estimated_calories": 120}]}"#;
        let suggestions = ResponseParser::new().suggestions(text, 5);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].estimated_calories, 120.0);
    }

    #[test]
    fn test_suggestions_garbage() {
        assert!(ResponseParser::new().suggestions("nothing here", 5).is_empty());
    }

    proptest! {
        #[test]
        fn parser_is_total(text in ".{0,300}") {
            let parser = ResponseParser::new();
            let record = parser.nutrition(&text);
            prop_assert!((0.0..=1.0).contains(&record.confidence));
            prop_assert!(record.calories >= 0.0);
            let _ = parser.quick_estimate(&text);
            let recipe = parser.recipe(&text);
            prop_assert!(recipe.servings >= 1);
            prop_assert!(parser.suggestions(&text, 3).len() <= 3);
        }
    }
}
