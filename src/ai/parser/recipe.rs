//! Recipe mapping
//!
//! JSON payloads map field by field with defaults; prose recipes are
//! split into sections by their headings ("Ingredients", "Instructions").

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::fallback;
use super::nutrition::{has_nutrition_fields, nutrition_from_value};
use crate::constants::parser::{FALLBACK_CONFIDENCE, JSON_CONFIDENCE};
use crate::types::{
    Difficulty, NutritionRecord, RecipeRecord, RecipeSuggestion, coerce_f64, json_string,
    json_string_list, json_u32,
};

const UNTITLED: &str = "Untitled Recipe";

static STEP_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[-*•]|\d+[.)]|step\s*\d+\s*[:.)-]?)\s*")
        .expect("valid step marker regex")
});

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| json_string(value, key))
}

/// Minutes from a number or a string like "1 hour 15 minutes"
fn minutes(value: &Value, keys: &[&str]) -> u32 {
    let Some(field) = keys.iter().find_map(|key| value.get(*key)) else {
        return 0;
    };
    match field {
        Value::String(s) => parse_duration_minutes(s),
        other => coerce_f64(other)
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u32)
            .unwrap_or(0),
    }
}

fn parse_duration_minutes(s: &str) -> u32 {
    static PART: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(h(?:ou)?rs?|h\b|m(?:in(?:ute)?s?)?\b)?")
            .expect("valid duration regex")
    });
    let total: f64 = PART
        .captures_iter(s)
        .filter_map(|caps| {
            let n = caps.get(1)?.as_str().parse::<f64>().ok()?;
            let is_hours = caps
                .get(2)
                .is_some_and(|u| u.as_str().to_lowercase().starts_with('h'));
            Some(if is_hours { n * 60.0 } else { n })
        })
        .sum();
    total.round().max(0.0) as u32
}

/// Ingredient strings; objects render as "amount unit name"
fn ingredient_lines(value: &Value) -> Vec<String> {
    let Some(Value::Array(items)) = value.get("ingredients") else {
        return json_string_list(value, "ingredients");
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(_) => {
                let name = first_string(item, &["name", "ingredient", "item"])?;
                let parts: Vec<String> = ["amount", "quantity", "unit"]
                    .iter()
                    .filter_map(|k| match item.get(*k) {
                        Some(Value::String(s)) if !s.trim().is_empty() => {
                            Some(s.trim().to_string())
                        }
                        Some(Value::Number(n)) => Some(n.to_string()),
                        _ => None,
                    })
                    .chain(std::iter::once(name))
                    .collect();
                Some(parts.join(" "))
            }
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Steps from an array or from numbered prose
fn instruction_lines(value: &Value) -> Vec<String> {
    let field = ["instructions", "steps", "directions", "method"]
        .iter()
        .find_map(|k| value.get(*k));
    match field {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(strip_marker(s)),
                Value::Object(_) => first_string(item, &["text", "instruction", "step"]),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .lines()
            .map(strip_marker)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn strip_marker(line: &str) -> String {
    STEP_MARKER.replace(line, "").trim().to_string()
}

fn difficulty(value: &Value) -> Difficulty {
    json_string(value, "difficulty")
        .and_then(|s| Difficulty::parse_lenient(&s))
        .unwrap_or_default()
}

/// A name, ingredients or steps; anything else is not a recipe payload
pub(super) fn has_recipe_fields(value: &Value) -> bool {
    first_string(value, &["name", "title", "recipe_name"]).is_some()
        || !ingredient_lines(value).is_empty()
        || !instruction_lines(value).is_empty()
}

/// Map a JSON payload to a recipe at JSON confidence
pub fn recipe_from_value(value: &Value) -> RecipeRecord {
    let nutrition = if has_nutrition_fields(value) {
        let mut record = nutrition_from_value(value);
        // Per-serving facts only; recipe-level names and ingredients live on the recipe
        record.meal_name = None;
        record.ingredients.clear();
        record.portions.clear();
        record
    } else {
        NutritionRecord::default()
    };

    RecipeRecord {
        name: first_string(value, &["name", "title", "recipe_name"])
            .unwrap_or_else(|| UNTITLED.to_string()),
        description: first_string(value, &["description", "summary"]).unwrap_or_default(),
        ingredients: ingredient_lines(value),
        instructions: instruction_lines(value),
        prep_time_min: minutes(value, &["prep_time_min", "prep_time", "prep_time_minutes"]),
        cook_time_min: minutes(value, &["cook_time_min", "cook_time", "cook_time_minutes"]),
        servings: json_u32(value, "servings", 1).max(1),
        difficulty: difficulty(value),
        nutrition,
        tags: json_string_list(value, "tags"),
        cuisine: first_string(value, &["cuisine", "cuisine_type"]),
        dietary_info: ["dietary_info", "dietary_tags", "diet"]
            .iter()
            .map(|k| json_string_list(value, k))
            .find(|list| !list.is_empty())
            .unwrap_or_default(),
        confidence: JSON_CONFIDENCE,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Ingredients,
    Instructions,
    Other,
}

fn heading(line: &str) -> Option<Section> {
    let cleaned = line
        .trim()
        .trim_matches(|c: char| c == '#' || c == '*' || c == ':' || c.is_whitespace())
        .to_lowercase();
    match cleaned.as_str() {
        "ingredients" | "ingredient list" | "you will need" => Some(Section::Ingredients),
        "instructions" | "directions" | "steps" | "method" | "preparation" => {
            Some(Section::Instructions)
        }
        "nutrition" | "nutrition per serving" | "notes" | "tips" => Some(Section::Other),
        _ => None,
    }
}

/// Recover a recipe from markdown-ish prose; `None` without any section
pub fn recipe_from_prose(text: &str) -> Option<RecipeRecord> {
    let mut name = None;
    let mut description = Vec::new();
    let mut ingredients = Vec::new();
    let mut instructions = Vec::new();
    let mut section = Section::Preamble;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(next) = heading(line) {
            section = next;
            continue;
        }
        match section {
            Section::Preamble if name.is_none() => {
                let title = line
                    .trim_matches(|c: char| c == '#' || c == '*' || c.is_whitespace())
                    .trim_start_matches("Recipe:")
                    .trim();
                if !title.is_empty() {
                    name = Some(title.to_string());
                }
            }
            Section::Preamble => description.push(line.to_string()),
            Section::Ingredients => {
                let item = strip_marker(line);
                if !item.is_empty() {
                    ingredients.push(item);
                }
            }
            Section::Instructions => {
                let step = strip_marker(line);
                if !step.is_empty() {
                    instructions.push(step);
                }
            }
            Section::Other => {}
        }
    }

    if ingredients.is_empty() && instructions.is_empty() {
        return None;
    }

    let nutrition = fallback::extract_nutrition(text)
        .map(|mut record| {
            record.ingredients.clear();
            record
        })
        .unwrap_or_default();

    Some(RecipeRecord {
        name: name.unwrap_or_else(|| UNTITLED.to_string()),
        description: description.join(" "),
        ingredients,
        instructions,
        prep_time_min: 0,
        cook_time_min: 0,
        servings: 1,
        difficulty: Difficulty::default(),
        nutrition,
        tags: Vec::new(),
        cuisine: None,
        dietary_info: Vec::new(),
        confidence: FALLBACK_CONFIDENCE,
    })
}

/// Map one suggestion entry; entries without a name are dropped
pub fn suggestion_from_value(value: &Value) -> Option<RecipeSuggestion> {
    Some(RecipeSuggestion {
        name: first_string(value, &["name", "title"])?,
        description: first_string(value, &["description", "summary"]).unwrap_or_default(),
        key_benefits: ["key_benefits", "benefits"]
            .iter()
            .map(|k| json_string_list(value, k))
            .find(|list| !list.is_empty())
            .unwrap_or_default(),
        estimated_calories: ["estimated_calories", "calories"]
            .iter()
            .find_map(|k| value.get(*k).and_then(coerce_f64))
            .unwrap_or(0.0)
            .max(0.0),
        prep_time_min: minutes(value, &["prep_time_min", "prep_time", "time_min"]),
        difficulty: difficulty(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::parser::ResponseParser;
    use serde_json::json;

    #[test]
    fn test_full_recipe_payload() {
        let value = json!({
            "name": "Lemon Herb Salmon",
            "description": "Bright and quick.",
            "ingredients": ["2 salmon fillets", {"name": "lemon", "amount": 1}],
            "instructions": ["1. Preheat oven", "2. Bake 12 minutes"],
            "prep_time": "10 minutes",
            "cook_time": 15,
            "servings": 2,
            "difficulty": "Easy",
            "nutrition_per_serving": {"calories": 380, "protein_g": 34, "carbs_g": 4, "fat_g": 24},
            "tags": ["quick", "high-protein"],
            "cuisine": "Mediterranean",
            "dietary_info": ["gluten-free"]
        });
        let recipe = recipe_from_value(&value);
        assert_eq!(recipe.name, "Lemon Herb Salmon");
        assert_eq!(recipe.ingredients, vec!["2 salmon fillets", "1 lemon"]);
        assert_eq!(recipe.instructions, vec!["Preheat oven", "Bake 12 minutes"]);
        assert_eq!(recipe.prep_time_min, 10);
        assert_eq!(recipe.cook_time_min, 15);
        assert_eq!(recipe.total_time_min(), 25);
        assert_eq!(recipe.servings, 2);
        assert_eq!(recipe.difficulty, Difficulty::Easy);
        assert_eq!(recipe.nutrition.calories, 380.0);
        assert!(recipe.nutrition.meal_name.is_none());
        assert_eq!(recipe.cuisine.as_deref(), Some("Mediterranean"));
        assert_eq!(recipe.dietary_info, vec!["gluten-free"]);
        assert_eq!(recipe.confidence, 0.8);
    }

    #[test]
    fn test_sparse_payload_defaults() {
        let recipe = recipe_from_value(&json!({"servings": 0, "difficulty": "n/a"}));
        assert_eq!(recipe.name, UNTITLED);
        assert_eq!(recipe.servings, 1);
        assert_eq!(recipe.difficulty, Difficulty::Medium);
        assert!(recipe.nutrition.has_no_macros());
    }

    #[test]
    fn test_huge_times_saturate_total() {
        let recipe = ResponseParser::new()
            .recipe(r#"{"name": "X", "prep_time_min": 4000000000, "cook_time_min": 4000000000}"#);
        assert_eq!(recipe.prep_time_min, 4_000_000_000);
        assert_eq!(recipe.total_time_min(), u32::MAX);
    }

    #[test]
    fn test_object_without_recipe_fields_is_not_a_recipe() {
        assert!(!has_recipe_fields(&json!({"error": "I cannot help with that"})));
        assert!(has_recipe_fields(&json!({"steps": ["Mix"]})));

        let recipe = ResponseParser::new().recipe(r#"{"error": "I cannot help with that"}"#);
        assert_eq!(recipe.name, "Recipe Generation Error");
        assert_eq!(recipe.confidence, 0.0);
        assert!(recipe.description.contains("I cannot help"));
    }

    #[test]
    fn test_duration_strings() {
        assert_eq!(parse_duration_minutes("1 hour 15 minutes"), 75);
        assert_eq!(parse_duration_minutes("45 min"), 45);
        assert_eq!(parse_duration_minutes("2h"), 120);
        assert_eq!(parse_duration_minutes("about 20"), 20);
        assert_eq!(parse_duration_minutes("none"), 0);
    }

    #[test]
    fn test_instructions_from_prose_string() {
        let value = json!({"instructions": "1. Boil water\n2) Add pasta\n\nStep 3: Drain"});
        assert_eq!(
            instruction_lines(&value),
            vec!["Boil water", "Add pasta", "Drain"]
        );
    }

    #[test]
    fn test_prose_recipe() {
        let text = "# Veggie Omelette\nA fluffy breakfast.\n\n## Ingredients\n- 3 eggs\n- 1/2 bell pepper\n\n## Instructions\n1. Whisk eggs\n2. Cook with pepper\n\n## Nutrition\nCalories: 310";
        let recipe = recipe_from_prose(text).unwrap();
        assert_eq!(recipe.name, "Veggie Omelette");
        assert_eq!(recipe.description, "A fluffy breakfast.");
        assert_eq!(recipe.ingredients, vec!["3 eggs", "1/2 bell pepper"]);
        assert_eq!(recipe.instructions, vec!["Whisk eggs", "Cook with pepper"]);
        assert_eq!(recipe.nutrition.calories, 310.0);
        assert_eq!(recipe.confidence, 0.6);
    }

    #[test]
    fn test_prose_without_sections() {
        assert!(recipe_from_prose("Sorry, I can't help with that.").is_none());
    }

    #[test]
    fn test_suggestion_entry() {
        let suggestion = suggestion_from_value(&json!({
            "name": "Chickpea Curry",
            "benefits": "fiber, plant protein",
            "calories": "450",
            "prep_time": "30 minutes",
            "difficulty": "easy"
        }))
        .unwrap();
        assert_eq!(suggestion.key_benefits, vec!["fiber", "plant protein"]);
        assert_eq!(suggestion.estimated_calories, 450.0);
        assert_eq!(suggestion.prep_time_min, 30);
        assert!(suggestion_from_value(&json!({"description": "nameless"})).is_none());
    }
}
