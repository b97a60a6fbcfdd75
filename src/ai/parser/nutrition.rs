//! Nutrition record mapping
//!
//! Maps a parsed JSON payload onto `NutritionRecord`. Field names vary
//! between prompts and models, so each field accepts a few aliases and
//! facts may sit at the top level or under a nested object.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::parser::JSON_CONFIDENCE;
use crate::types::{
    MealType, NutritionRecord, coerce_f64, json_string, json_string_list, json_string_map,
};

/// Nested objects that hold the numeric facts
const FACT_CONTAINERS: &[&str] = &[
    "nutrition",
    "nutrition_per_serving",
    "nutrition_facts",
    "nutritional_info",
    "macros",
];

const CALORIE_KEYS: &[&str] = &["calories", "kcal", "energy_kcal", "total_calories"];
const PROTEIN_KEYS: &[&str] = &["protein_g", "protein"];
const CARB_KEYS: &[&str] = &["carbs_g", "carbohydrates_g", "carbs", "carbohydrates"];
const FAT_KEYS: &[&str] = &["fat_g", "fat", "total_fat_g"];
const FIBER_KEYS: &[&str] = &["fiber_g", "fiber", "fibre_g"];
const SUGAR_KEYS: &[&str] = &["sugar_g", "sugar", "sugars_g"];
const SODIUM_KEYS: &[&str] = &["sodium_mg", "sodium"];

/// First numeric value among `keys`, floored at zero
fn first_number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(coerce_f64))
        .map(|n| n.max(0.0))
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| json_string(value, key))
}

/// The object holding macro values: a known container, else the root
pub(super) fn fact_object(value: &Value) -> &Value {
    FACT_CONTAINERS
        .iter()
        .find_map(|key| value.get(*key).filter(|v| v.is_object()))
        .unwrap_or(value)
}

/// Whether any macro field is present at all
pub(super) fn has_nutrition_fields(value: &Value) -> bool {
    let facts = fact_object(value);
    [CALORIE_KEYS, PROTEIN_KEYS, CARB_KEYS, FAT_KEYS]
        .iter()
        .any(|keys| first_number(facts, keys).is_some())
}

/// Ingredients as names plus a name -> amount map
///
/// Accepts `["rice", ...]`, `"rice, beans"`, or
/// `[{"name": "rice", "amount": "1 cup"}, ...]`.
fn ingredients_and_portions(value: &Value) -> (Vec<String>, BTreeMap<String, String>) {
    let mut portions = json_string_map(value, "portions");

    let Some(Value::Array(items)) = value.get("ingredients") else {
        return (json_string_list(value, "ingredients"), portions);
    };

    let mut names = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) if !s.trim().is_empty() => names.push(s.trim().to_string()),
            Value::Object(_) => {
                let Some(name) = first_string(item, &["name", "ingredient", "item"]) else {
                    continue;
                };
                if let Some(amount) = first_string(item, &["amount", "quantity", "portion"]) {
                    portions.entry(name.clone()).or_insert(amount);
                }
                names.push(name);
            }
            _ => {}
        }
    }
    (names, portions)
}

/// Map a JSON payload to a record at JSON confidence
pub fn nutrition_from_value(value: &Value) -> NutritionRecord {
    let facts = fact_object(value);
    let (ingredients, portions) = ingredients_and_portions(value);

    NutritionRecord {
        calories: first_number(facts, CALORIE_KEYS).unwrap_or(0.0),
        protein_g: first_number(facts, PROTEIN_KEYS).unwrap_or(0.0),
        carbs_g: first_number(facts, CARB_KEYS).unwrap_or(0.0),
        fat_g: first_number(facts, FAT_KEYS).unwrap_or(0.0),
        fiber_g: first_number(facts, FIBER_KEYS).filter(|n| *n > 0.0),
        sugar_g: first_number(facts, SUGAR_KEYS).filter(|n| *n > 0.0),
        sodium_mg: first_number(facts, SODIUM_KEYS).filter(|n| *n > 0.0),
        meal_name: first_string(value, &["meal_name", "name", "meal", "dish"]),
        ingredients,
        portions,
        meal_type: first_string(value, &["meal_type"]).and_then(|s| s.parse::<MealType>().ok()),
        confidence: JSON_CONFIDENCE,
        notes: first_string(value, &["confidence_notes", "notes", "note"]),
    }
}
