use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Meal occasion reported by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => Err(format!(
                "Unknown meal type: {}. Valid values: breakfast, lunch, dinner, snack",
                s
            )),
        }
    }
}

/// Nutrition facts for one meal or one recipe serving.
///
/// Macro fields are always present (0.0 when unknown); micronutrients are
/// optional. `confidence` reflects how the record was extracted (strict JSON,
/// prose fallback, or nothing), not the model's own confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionRecord {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sodium_mg: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_name: Option<String>,
    pub ingredients: Vec<String>,
    /// Ingredient -> estimated amount ("150g", "1 cup")
    pub portions: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,

    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for NutritionRecord {
    fn default() -> Self {
        Self {
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
            fiber_g: None,
            sugar_g: None,
            sodium_mg: None,
            meal_name: None,
            ingredients: Vec::new(),
            portions: BTreeMap::new(),
            meal_type: None,
            confidence: 0.0,
            notes: None,
        }
    }
}

impl NutritionRecord {
    /// All-zero record carrying an explanation of why nothing was extracted
    pub fn empty(note: impl Into<String>) -> Self {
        Self {
            notes: Some(note.into()),
            ..Default::default()
        }
    }

    /// True when no macro value was recovered
    pub fn has_no_macros(&self) -> bool {
        self.calories == 0.0 && self.protein_g == 0.0 && self.carbs_g == 0.0 && self.fat_g == 0.0
    }

    /// Energy from macros (4/4/9 kcal per gram)
    pub fn macro_calories(&self) -> f64 {
        self.protein_g * 4.0 + self.carbs_g * 4.0 + self.fat_g * 9.0
    }
}

/// Calorie-only estimate from a text description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickEstimate {
    pub calories: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuickEstimate {
    /// Zero-calorie answer for output that could not be read
    pub fn unanalyzed(error: impl Into<String>) -> Self {
        Self {
            calories: 0.0,
            description: "Could not analyze".to_string(),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_has_zero_macros() {
        let record = NutritionRecord::empty("nothing found");
        assert!(record.has_no_macros());
        assert_eq!(record.notes.as_deref(), Some("nothing found"));
        assert_eq!(record.confidence, 0.0);
    }

    #[test]
    fn test_optional_fields_skipped_in_json() {
        let record = NutritionRecord {
            calories: 450.0,
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["calories"], 450.0);
        assert!(json.get("fiber_g").is_none());
        assert!(json.get("protein_g").is_some());
    }

    #[test]
    fn test_deserialize_partial_record() {
        let record: NutritionRecord =
            serde_json::from_str(r#"{"calories": 300, "meal_type": "lunch"}"#).unwrap();
        assert_eq!(record.calories, 300.0);
        assert_eq!(record.fat_g, 0.0);
        assert_eq!(record.meal_type, Some(MealType::Lunch));
    }

    #[test]
    fn test_meal_type_from_str() {
        assert_eq!("Dinner".parse::<MealType>(), Ok(MealType::Dinner));
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn test_macro_calories() {
        let record = NutritionRecord {
            protein_g: 10.0,
            carbs_g: 20.0,
            fat_g: 5.0,
            ..Default::default()
        };
        assert_eq!(record.macro_calories(), 165.0);
    }
}
