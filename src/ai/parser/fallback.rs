//! Prose fallback extraction
//!
//! When a model ignores the JSON instructions, nutrition figures are pulled
//! out of sentences like "Calories: 450" or "about 450 calories and 30g
//! protein". Each nutrient accepts label-first and value-first phrasing;
//! the earliest match in the text wins.

use regex::Regex;
use std::sync::LazyLock;

use crate::constants::parser::FALLBACK_CONFIDENCE;
use crate::types::{NutritionRecord, split_list};

pub(super) const FALLBACK_NOTE: &str = "Parsed from natural language response (fallback mode)";

/// Label-first / value-first regex pair for one nutrient
struct NutrientPattern {
    label_first: Regex,
    value_first: Regex,
}

impl NutrientPattern {
    /// `label` and `unit` are regex fragments
    fn new(label: &str, unit: &str) -> Self {
        const NUM: &str = r"(\d+(?:\.\d+)?)";
        const FILLER: &str =
            r"[\s*:=\-]*(?:(?:is|are|of|about|around|approximately|approx\.?|roughly|~)\s*)*";
        let label_first = format!(r"(?i)\b(?:{label})\b{FILLER}{NUM}");
        let value_first = format!(r"(?i){NUM}\s*(?:{unit})\s+(?:of\s+)?(?:{label})\b");
        Self {
            label_first: Regex::new(&label_first).expect("valid label-first regex"),
            value_first: Regex::new(&value_first).expect("valid value-first regex"),
        }
    }

    fn with_value_first(label: &str, value_first: &str) -> Self {
        Self {
            value_first: Regex::new(value_first).expect("valid value-first regex"),
            ..Self::new(label, GRAMS)
        }
    }

    fn find(&self, text: &str) -> Option<f64> {
        let candidates = [
            self.label_first.captures(text),
            self.value_first.captures(text),
        ];
        candidates
            .into_iter()
            .flatten()
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
                Some((start, value))
            })
            .min_by_key(|(start, _)| *start)
            .map(|(_, value)| value)
    }
}

const GRAMS: &str = r"g|grams?";

// The unit is the label here: "450 calories", "520 kcal"
static CALORIES: LazyLock<NutrientPattern> = LazyLock::new(|| {
    NutrientPattern::with_value_first(
        r"calories|kcal|energy",
        r"(?i)(\d+(?:\.\d+)?)\s*(?:k?cal(?:orie)?s?)\b",
    )
});
static PROTEIN: LazyLock<NutrientPattern> =
    LazyLock::new(|| NutrientPattern::new("protein", GRAMS));
static CARBS: LazyLock<NutrientPattern> = LazyLock::new(|| {
    NutrientPattern::new(r"carbs|carbohydrates?|total\s+carbohydrates?", GRAMS)
});
static FAT: LazyLock<NutrientPattern> =
    LazyLock::new(|| NutrientPattern::new(r"fats?|total\s+fats?", GRAMS));
static FIBER: LazyLock<NutrientPattern> =
    LazyLock::new(|| NutrientPattern::new(r"fiber|fibre|dietary\s+fiber", GRAMS));
static SUGAR: LazyLock<NutrientPattern> = LazyLock::new(|| NutrientPattern::new("sugars?", GRAMS));
static SODIUM: LazyLock<NutrientPattern> =
    LazyLock::new(|| NutrientPattern::new("sodium", r"mg|milligrams?"));

static INGREDIENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ingredients?\s*:?[ \t]*([^\n]+)").expect("valid ingredients regex")
});

/// Extract nutrition from prose; `None` when no macro figure was found
pub fn extract_nutrition(text: &str) -> Option<NutritionRecord> {
    let calories = CALORIES.find(text);
    let protein = PROTEIN.find(text);
    let carbs = CARBS.find(text);
    let fat = FAT.find(text);

    if calories.is_none() && protein.is_none() && carbs.is_none() && fat.is_none() {
        return None;
    }

    Some(NutritionRecord {
        calories: calories.unwrap_or(0.0),
        protein_g: protein.unwrap_or(0.0),
        carbs_g: carbs.unwrap_or(0.0),
        fat_g: fat.unwrap_or(0.0),
        fiber_g: FIBER.find(text).filter(|v| *v > 0.0),
        sugar_g: SUGAR.find(text).filter(|v| *v > 0.0),
        sodium_mg: SODIUM.find(text).filter(|v| *v > 0.0),
        ingredients: extract_ingredients(text),
        confidence: FALLBACK_CONFIDENCE,
        notes: Some(FALLBACK_NOTE.to_string()),
        ..Default::default()
    })
}

/// Items from an "Ingredients: a, b; c" line
pub fn extract_ingredients(text: &str) -> Vec<String> {
    INGREDIENTS
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| split_list(m.as_str()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_first_sentence() {
        let record =
            extract_nutrition("This meal has about 450 calories and 30g protein").unwrap();
        assert_eq!(record.calories, 450.0);
        assert_eq!(record.protein_g, 30.0);
        assert_eq!(record.carbs_g, 0.0);
        assert_eq!(record.confidence, 0.6);
        assert_eq!(record.notes.as_deref(), Some(FALLBACK_NOTE));
    }

    #[test]
    fn test_label_first_list() {
        let text = "Calories: 520\nProtein: 32g\nCarbs: 48g\nFat: 18g\nFiber: 6g\nSodium: 700mg";
        let record = extract_nutrition(text).unwrap();
        assert_eq!(record.calories, 520.0);
        assert_eq!(record.protein_g, 32.0);
        assert_eq!(record.carbs_g, 48.0);
        assert_eq!(record.fat_g, 18.0);
        assert_eq!(record.fiber_g, Some(6.0));
        assert_eq!(record.sodium_mg, Some(700.0));
    }

    #[test]
    fn test_markdown_labels() {
        let record = extract_nutrition("**Calories:** ~610\n**Protein:** about 25 g").unwrap();
        assert_eq!(record.calories, 610.0);
        assert_eq!(record.protein_g, 25.0);
    }

    #[test]
    fn test_earliest_match_wins() {
        let record = extract_nutrition("520 kcal, 30g protein 45g carbs, 12 grams of fat").unwrap();
        assert_eq!(record.calories, 520.0);
        assert_eq!(record.protein_g, 30.0);
        assert_eq!(record.carbs_g, 45.0);
        assert_eq!(record.fat_g, 12.0);
    }

    #[test]
    fn test_ingredients_line() {
        let text = "Ingredients: rice, black beans; salsa\nCalories: 500";
        let record = extract_nutrition(text).unwrap();
        assert_eq!(record.ingredients, vec!["rice", "black beans", "salsa"]);
    }

    #[test]
    fn test_nothing_found() {
        assert!(extract_nutrition("I cannot see any food in this picture.").is_none());
        assert!(extract_nutrition("").is_none());
    }
}
