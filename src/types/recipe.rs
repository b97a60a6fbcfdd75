use serde::{Deserialize, Serialize};

use super::nutrition::{MealType, NutritionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient parse used on model output; unknown values yield `None`
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "beginner" | "simple" => Some(Difficulty::Easy),
            "medium" | "moderate" | "intermediate" => Some(Difficulty::Medium),
            "hard" | "difficult" | "advanced" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// A complete recipe with per-serving nutrition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    /// Ordered preparation steps
    pub instructions: Vec<String>,
    pub prep_time_min: u32,
    pub cook_time_min: u32,
    pub servings: u32,
    pub difficulty: Difficulty,
    pub nutrition: NutritionRecord,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    pub dietary_info: Vec<String>,
    /// Extraction quality, same scale as `NutritionRecord::confidence`
    pub confidence: f32,
}

impl RecipeRecord {
    /// Placeholder returned when the model output held no usable recipe
    pub fn unparsed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            name: "Recipe Generation Error".to_string(),
            description: format!("Could not parse recipe: {}", reason),
            ingredients: Vec::new(),
            instructions: Vec::new(),
            prep_time_min: 0,
            cook_time_min: 0,
            servings: 1,
            difficulty: Difficulty::Medium,
            nutrition: NutritionRecord::empty(reason),
            tags: Vec::new(),
            cuisine: None,
            dietary_info: Vec::new(),
            confidence: 0.0,
        }
    }

    pub fn total_time_min(&self) -> u32 {
        self.prep_time_min.saturating_add(self.cook_time_min)
    }
}

/// Short recipe idea returned by suggestion requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSuggestion {
    pub name: String,
    pub description: String,
    pub key_benefits: Vec<String>,
    pub estimated_calories: f64,
    pub prep_time_min: u32,
    pub difficulty: Difficulty,
}

/// Constraints for text-based recipe generation; empty fields are omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeRequest {
    pub ingredients: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub health_goals: Vec<String>,
    pub cuisine: Option<String>,
    pub max_calories: Option<u32>,
    pub meal_type: Option<MealType>,
}

/// How a photo-based recipe relates to the pictured dish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipePreference {
    #[default]
    Similar,
    Healthier,
    Different,
}

impl RecipePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipePreference::Similar => "similar",
            RecipePreference::Healthier => "healthier",
            RecipePreference::Different => "different",
        }
    }

    /// Extra instruction appended to the photo recipe prompt
    pub fn instruction(&self) -> &'static str {
        match self {
            RecipePreference::Healthier => {
                "Create a healthier version with fewer calories, less fat, and more vegetables."
            }
            RecipePreference::Different => {
                "Create a different recipe inspired by the flavors and ingredients in this dish."
            }
            RecipePreference::Similar => {
                "Create a recipe that recreates this dish as accurately as possible."
            }
        }
    }
}

impl std::fmt::Display for RecipePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecipePreference {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "similar" | "recreate" => Ok(RecipePreference::Similar),
            "healthier" | "healthy" => Ok(RecipePreference::Healthier),
            "different" | "inspired" => Ok(RecipePreference::Different),
            other => Err(format!(
                "unknown recipe preference '{}' (expected similar, healthier or different)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparsed_recipe_is_well_formed() {
        let recipe = RecipeRecord::unparsed("no JSON object found");
        assert_eq!(recipe.servings, 1);
        assert!(recipe.nutrition.has_no_macros());
        assert!(recipe.description.contains("no JSON object found"));
        assert_eq!(recipe.confidence, 0.0);
    }

    #[test]
    fn test_difficulty_lenient() {
        assert_eq!(Difficulty::parse_lenient(" Easy "), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse_lenient("moderate"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse_lenient("easy|medium|hard"), None);
    }

    #[test]
    fn test_preference_parse() {
        assert_eq!("Healthier".parse::<RecipePreference>(), Ok(RecipePreference::Healthier));
        assert_eq!(RecipePreference::default(), RecipePreference::Similar);
        assert!("spicier".parse::<RecipePreference>().is_err());
        assert!(RecipePreference::Different.instruction().contains("inspired by"));
    }
}
