//! Caller-supplied context
//!
//! Snapshot of the user's profile handed to the AI core by the surrounding
//! application. Every field is optional; consumers skip what is missing.

use serde::{Deserialize, Serialize};

/// Health profile injected into chat and suggestion prompts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserContext {
    pub health_goals: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub daily_calorie_goal: Option<u32>,
    /// Number of meals logged recently
    pub recent_meals: Option<u32>,
    pub average_daily_calories: Option<f64>,
    pub preferences: Option<String>,
}

impl UserContext {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Macro totals attached to a logged meal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealMacros {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// One logged meal, as summarised for diet-trend analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealSummary {
    pub name: Option<String>,
    pub nutrition: Option<MealMacros>,
    pub logged_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        assert!(UserContext::default().is_empty());
        let ctx = UserContext {
            daily_calorie_goal: Some(2000),
            ..Default::default()
        };
        assert!(!ctx.is_empty());
    }

    #[test]
    fn test_meal_summary_deserialize_sparse() {
        let meals: Vec<MealSummary> = serde_json::from_str(
            r#"[{"name": "Oatmeal", "nutrition": {"calories": 300}}, {}]"#,
        )
        .unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].nutrition.as_ref().unwrap().calories, 300.0);
        assert!(meals[1].name.is_none());
    }
}
